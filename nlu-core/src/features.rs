//! # Feature extraction for sequence tagging
//!
//! Converts a `(text, pos_tag)` token sequence into one string feature set
//! per token, using a sliding context window. The model's learned weights
//! are keyed on these exact strings, so extraction must be deterministic and
//! byte-for-byte identical between training and inference.
//!
//! ## Features per token
//!
//! - `bias` — constant marker, present on every token
//! - `word.lower=`, `word[-3:]=`, `word[-2:]=` — lexical form and suffixes
//! - `word.isupper=`, `word.istitle=`, `word.isdigit=` — shape flags
//! - `postag=`, `postag[:2]=` — POS tag and its coarse prefix
//!
//! Each neighbour within the window contributes five of these (lower, the
//! two shape flags, and both POS features) prefixed with its signed offset,
//! e.g. `-1:word.lower=the`. The first token carries a literal `BOS` marker,
//! the last a literal `EOS`; a one-token sentence carries both.
//!
//! Suffix slicing is last-k-characters-or-fewer: a short word contributes
//! itself, never an error.

use crate::annotator::Token;

/// Ordered list of string features describing one token in context.
pub type FeatureSet = Vec<String>;

/// Deterministic token-sequence → feature-sequence mapping.
///
/// The window is one token on each side by default; widening it is a tuning
/// knob, not a semantic change, so it is a parameter rather than a constant.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    window: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self { window: 1 }
    }
}

impl FeatureExtractor {
    /// Extractor with a custom context window (`window` tokens on each side).
    pub fn with_window(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Feature sets for the whole sentence, aligned index-for-index with the
    /// input tokens.
    pub fn extract(&self, tokens: &[Token]) -> Vec<FeatureSet> {
        (0..tokens.len())
            .map(|i| self.token_features(tokens, i))
            .collect()
    }

    fn token_features(&self, tokens: &[Token], i: usize) -> FeatureSet {
        let token = &tokens[i];
        let word = &token.text;
        let postag = &token.pos_tag;

        let mut features = vec![
            "bias".to_string(),
            format!("word.lower={}", word.to_lowercase()),
            format!("word[-3:]={}", suffix(word, 3)),
            format!("word[-2:]={}", suffix(word, 2)),
            format!("word.isupper={}", is_upper(word)),
            format!("word.istitle={}", is_title(word)),
            format!("word.isdigit={}", is_digit(word)),
            format!("postag={}", postag),
            format!("postag[:2]={}", prefix(postag, 2)),
        ];

        for offset in 1..=self.window {
            if i >= offset {
                context_features(&tokens[i - offset], &format!("-{offset}:"), &mut features);
            }
        }
        if i == 0 {
            features.push("BOS".to_string());
        }

        for offset in 1..=self.window {
            if i + offset < tokens.len() {
                context_features(&tokens[i + offset], &format!("+{offset}:"), &mut features);
            }
        }
        if i + 1 == tokens.len() {
            features.push("EOS".to_string());
        }

        features
    }
}

/// The five context features of a neighbouring token, tagged with its offset.
fn context_features(token: &Token, tag: &str, out: &mut FeatureSet) {
    let word = &token.text;
    let postag = &token.pos_tag;
    out.push(format!("{tag}word.lower={}", word.to_lowercase()));
    out.push(format!("{tag}word.istitle={}", is_title(word)));
    out.push(format!("{tag}word.isupper={}", is_upper(word)));
    out.push(format!("{tag}postag={}", postag));
    out.push(format!("{tag}postag[:2]={}", prefix(postag, 2)));
}

/// Last `n` characters, or the whole string if shorter.
fn suffix(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}

/// First `n` characters, or the whole string if shorter.
fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// At least one cased character, and no lowercase ones.
fn is_upper(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// First alphabetic character uppercase, remaining alphabetic ones lowercase.
fn is_title(s: &str) -> bool {
    let mut chars = s.chars().filter(|c| c.is_alphabetic());
    match chars.next() {
        Some(first) => first.is_uppercase() && chars.all(|c| c.is_lowercase()),
        None => false,
    }
}

fn is_digit(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::{Annotator, HeuristicAnnotator};

    fn featurize(text: &str) -> Vec<FeatureSet> {
        let tokens = HeuristicAnnotator.annotate(text);
        FeatureExtractor::default().extract(&tokens)
    }

    #[test]
    fn test_current_token_feature_order() {
        let features = featurize("Paris");
        assert_eq!(
            features[0],
            vec![
                "bias",
                "word.lower=paris",
                "word[-3:]=ris",
                "word[-2:]=is",
                "word.isupper=false",
                "word.istitle=true",
                "word.isdigit=false",
                "postag=NNP",
                "postag[:2]=NN",
                "BOS",
                "EOS",
            ]
        );
    }

    #[test]
    fn test_bos_and_eos_markers() {
        let features = featurize("book a flight");
        assert!(features[0].contains(&"BOS".to_string()));
        assert!(!features[0].contains(&"EOS".to_string()));
        assert!(features[2].contains(&"EOS".to_string()));
        assert!(!features[2].contains(&"BOS".to_string()));
        assert!(!features[1].contains(&"BOS".to_string()));
        assert!(!features[1].contains(&"EOS".to_string()));
    }

    #[test]
    fn test_single_token_has_both_markers() {
        let features = featurize("hello");
        assert!(features[0].contains(&"BOS".to_string()));
        assert!(features[0].contains(&"EOS".to_string()));
    }

    #[test]
    fn test_neighbour_features_are_prefixed() {
        let features = featurize("book a flight");
        let middle = &features[1];
        assert!(middle.contains(&"-1:word.lower=book".to_string()));
        assert!(middle.contains(&"+1:word.lower=flight".to_string()));
        assert!(middle.contains(&"-1:postag=NN".to_string()));
    }

    #[test]
    fn test_short_word_suffixes_do_not_error() {
        let features = featurize("a");
        assert!(features[0].contains(&"word[-3:]=a".to_string()));
        assert!(features[0].contains(&"word[-2:]=a".to_string()));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            featurize("fly me to new york"),
            featurize("fly me to new york")
        );
    }

    #[test]
    fn test_same_length_as_input() {
        let tokens = HeuristicAnnotator.annotate("one two three four");
        let features = FeatureExtractor::default().extract(&tokens);
        assert_eq!(features.len(), tokens.len());
    }

    #[test]
    fn test_wider_window_emits_offset_two() {
        let tokens = HeuristicAnnotator.annotate("book a flight to paris");
        let features = FeatureExtractor::with_window(2).extract(&tokens);
        assert!(features[2].contains(&"-2:word.lower=book".to_string()));
        assert!(features[2].contains(&"+2:word.lower=paris".to_string()));
        // Window 1 output is a strict prefix-compatible subset
        assert!(features[2].contains(&"-1:word.lower=a".to_string()));
    }

    #[test]
    fn test_shape_helpers() {
        assert!(is_upper("NYC"));
        assert!(!is_upper("Nyc"));
        assert!(!is_upper("123"));
        assert!(is_title("Paris"));
        assert!(!is_title("PARIS"));
        assert!(!is_title("paris"));
        assert!(is_digit("42"));
        assert!(!is_digit("4two"));
        assert!(!is_digit(""));
    }
}
