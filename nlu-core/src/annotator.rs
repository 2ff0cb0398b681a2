//! # Linguistic annotation seam
//!
//! Tokenization and part-of-speech tagging are external collaborators of this
//! pipeline: given raw text, an [`Annotator`] returns an ordered sequence of
//! tokens, each carrying its surface form and a POS tag. The rest of the
//! crate only depends on the [`Annotator`] trait, so a real NLP service
//! (spaCy, UDPipe, ...) can be plugged in behind it.
//!
//! [`HeuristicAnnotator`] is the built-in implementation used by the demo
//! server and the test suite. It splits on whitespace and guesses coarse
//! Penn-style tags from word shape and a small closed-class list. It is
//! deliberately simple: the pipeline's correctness does not depend on tag
//! quality, only on determinism and order preservation.

use serde::{Deserialize, Serialize};

/// One token of a sentence, as produced by the external annotator.
///
/// Immutable and ordered; the position in the sentence vector defines the
/// token index everything downstream aligns against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form, exactly as it appears in the text.
    pub text: String,
    /// Part-of-speech tag (e.g. "NN", "NNP", "CD").
    pub pos_tag: String,
}

impl Token {
    pub fn new(text: impl Into<String>, pos_tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos_tag: pos_tag.into(),
        }
    }
}

/// External tokenizer + POS tagger. Must be deterministic and
/// order-preserving for a given input text.
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str) -> Vec<Token>;
}

/// Closed-class words mapped to fixed tags by the heuristic annotator.
const FUNCTION_WORDS: &[(&str, &str)] = &[
    ("a", "DT"),
    ("an", "DT"),
    ("the", "DT"),
    ("this", "DT"),
    ("that", "DT"),
    ("to", "TO"),
    ("of", "IN"),
    ("in", "IN"),
    ("on", "IN"),
    ("at", "IN"),
    ("for", "IN"),
    ("from", "IN"),
    ("with", "IN"),
    ("and", "CC"),
    ("or", "CC"),
    ("i", "PRP"),
    ("you", "PRP"),
    ("me", "PRP"),
    ("my", "PRP$"),
    ("is", "VBZ"),
    ("are", "VBP"),
    ("was", "VBD"),
    ("be", "VB"),
    ("please", "UH"),
];

/// Whitespace tokenizer with shape-based POS guesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnnotator;

impl HeuristicAnnotator {
    fn guess_tag(word: &str) -> &'static str {
        let lower = word.to_lowercase();
        if let Some(&(_, tag)) = FUNCTION_WORDS.iter().find(|&&(w, _)| w == lower) {
            return tag;
        }
        let mut chars = word.chars();
        match chars.next() {
            None => "NN",
            Some(_) if word.chars().all(|c| c.is_ascii_digit()) => "CD",
            Some(c) if word.chars().count() == 1 && !c.is_alphanumeric() => ".",
            Some(c) if c.is_uppercase() => "NNP",
            Some(_) if lower.ends_with("ing") => "VBG",
            Some(_) if lower.ends_with("ly") => "RB",
            Some(_) => "NN",
        }
    }
}

impl Annotator for HeuristicAnnotator {
    fn annotate(&self, text: &str) -> Vec<Token> {
        text.split_whitespace()
            .map(|word| Token::new(word, Self::guess_tag(word)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_preserves_order_and_surface() {
        let tokens = HeuristicAnnotator.annotate("book a flight to paris");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["book", "a", "flight", "to", "paris"]);
    }

    #[test]
    fn test_tag_guesses() {
        let tokens = HeuristicAnnotator.annotate("Paris 2024 booking !");
        assert_eq!(tokens[0].pos_tag, "NNP");
        assert_eq!(tokens[1].pos_tag, "CD");
        assert_eq!(tokens[2].pos_tag, "VBG");
        assert_eq!(tokens[3].pos_tag, ".");
    }

    #[test]
    fn test_annotate_is_deterministic() {
        let a = HeuristicAnnotator.annotate("fly me to new york");
        let b = HeuristicAnnotator.annotate("fly me to new york");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text() {
        assert!(HeuristicAnnotator.annotate("   ").is_empty());
    }
}
