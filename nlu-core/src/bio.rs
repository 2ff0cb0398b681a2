//! # BIO encoding of annotated sentences
//!
//! Turns a tokenized sentence plus its character-span entity annotations into
//! a per-token training record in the **BIO** scheme:
//!
//! - `B-<name>`: first token of an entity span
//! - `I-<name>`: each subsequent token of the same span
//! - `O`: outside any entity
//!
//! Every token starts as `O`. Annotations are applied in the order supplied;
//! each one is resolved through the span aligner and, on success, overwrites
//! the labels of its covered tokens. No overlap detection is performed, so a
//! later annotation may overwrite labels set by an earlier one.
//!
//! An annotation that fails to resolve is skipped: the sentence and the rest
//! of the batch proceed, and the skip is recorded in the output (and logged)
//! so callers and tests can observe it. A sentence with zero valid
//! annotations is still a valid all-`O` record — that is the negative
//! training signal.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::annotator::Token;
use crate::error::SpanError;
use crate::span;

/// Label applied to tokens outside any entity.
pub const OUTSIDE: &str = "O";

/// A character-offset entity annotation from training data. May be invalid
/// (out of range, misaligned); invalid annotations are dropped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Entity name, e.g. "city". Becomes the suffix of `B-`/`I-` labels.
    pub name: String,
    /// First character of the span (see `span` module for the exact
    /// arithmetic these offsets go through).
    pub begin: usize,
    /// One past the last character of the span.
    pub end: usize,
}

impl Annotation {
    pub fn new(name: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            begin,
            end,
        }
    }
}

/// One token of a training record: surface form, POS tag and BIO label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledToken {
    pub text: String,
    pub pos_tag: String,
    pub label: String,
}

/// An annotation that could not be resolved, with the reason. Kept alongside
/// the encoded sentence instead of being silently discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAnnotation {
    pub annotation: Annotation,
    pub reason: SpanError,
}

/// Result of encoding one sentence: the labeled tokens (always the same
/// length and order as the input tokens) plus any skipped annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSentence {
    pub tokens: Vec<LabeledToken>,
    pub skipped: Vec<SkippedAnnotation>,
}

impl EncodedSentence {
    /// Labels only, in token order. This is the `y` sequence the model fits.
    pub fn labels(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.label.clone()).collect()
    }
}

/// Encode one sentence's tokens and annotations into a BIO training record.
pub fn encode(text: &str, tokens: &[Token], annotations: &[Annotation]) -> EncodedSentence {
    let mut labeled: Vec<LabeledToken> = tokens
        .iter()
        .map(|t| LabeledToken {
            text: t.text.clone(),
            pos_tag: t.pos_tag.clone(),
            label: OUTSIDE.to_string(),
        })
        .collect();
    let mut skipped = Vec::new();

    for annotation in annotations {
        match span::align(text, tokens.len(), annotation.begin, annotation.end) {
            Ok(covered) => {
                for (n, idx) in covered.indices().enumerate() {
                    let prefix = if n == 0 { "B" } else { "I" };
                    labeled[idx].label = format!("{}-{}", prefix, annotation.name);
                }
            }
            Err(reason) => {
                warn!(
                    entity = %annotation.name,
                    begin = annotation.begin,
                    end = annotation.end,
                    %reason,
                    "skipping unresolvable annotation"
                );
                skipped.push(SkippedAnnotation {
                    annotation: annotation.clone(),
                    reason,
                });
            }
        }
    }

    EncodedSentence {
        tokens: labeled,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::{Annotator, HeuristicAnnotator};

    fn encode_text(text: &str, annotations: &[Annotation]) -> EncodedSentence {
        let tokens = HeuristicAnnotator.annotate(text);
        encode(text, &tokens, annotations)
    }

    #[test]
    fn test_output_length_matches_tokens() {
        let encoded = encode_text("book a flight to paris tomorrow", &[]);
        assert_eq!(encoded.tokens.len(), 6);
    }

    #[test]
    fn test_no_annotations_yields_all_outside() {
        let encoded = encode_text("book a flight to paris tomorrow", &[]);
        assert!(encoded.tokens.iter().all(|t| t.label == OUTSIDE));
        assert!(encoded.skipped.is_empty());
    }

    #[test]
    fn test_single_token_entity() {
        let encoded = encode_text(
            "book a flight to paris tomorrow",
            &[Annotation::new("city", 17, 22)],
        );
        assert_eq!(encoded.labels(), vec!["O", "O", "O", "O", "B-city", "O"]);
    }

    #[test]
    fn test_multi_token_entity_gets_b_then_i() {
        let encoded = encode_text(
            "fly me to new york today",
            &[Annotation::new("city", 10, 18)],
        );
        assert_eq!(
            encoded.labels(),
            vec!["O", "O", "O", "B-city", "I-city", "O"]
        );
    }

    #[test]
    fn test_invalid_annotation_is_skipped_not_fatal() {
        let encoded = encode_text(
            "book a flight to paris tomorrow",
            &[
                Annotation::new("broken", 500, 600),
                Annotation::new("city", 17, 22),
            ],
        );
        // The bad annotation is recorded, the good one still applies.
        assert_eq!(encoded.skipped.len(), 1);
        assert_eq!(encoded.skipped[0].annotation.name, "broken");
        assert_eq!(encoded.tokens[4].label, "B-city");
    }

    #[test]
    fn test_every_label_is_outside_or_bio() {
        let encoded = encode_text(
            "fly me to new york today",
            &[Annotation::new("city", 10, 18)],
        );
        for t in &encoded.tokens {
            let ok = t.label == OUTSIDE
                || ((t.label.starts_with("B-") || t.label.starts_with("I-"))
                    && t.label.len() > 2);
            assert!(ok, "unexpected label {:?}", t.label);
        }
    }

    #[test]
    fn test_later_annotation_overwrites_earlier() {
        let text = "fly me to new york today";
        let encoded = encode_text(
            text,
            &[
                Annotation::new("city", 10, 18),
                // Same range, applied second: wins on every covered token.
                Annotation::new("destination", 10, 18),
            ],
        );
        assert_eq!(encoded.tokens[3].label, "B-destination");
        assert_eq!(encoded.tokens[4].label, "I-destination");
    }

    #[test]
    fn test_pos_tags_are_carried_through() {
        let encoded = encode_text("book a flight to paris tomorrow", &[]);
        let tokens = HeuristicAnnotator.annotate("book a flight to paris tomorrow");
        for (labeled, token) in encoded.tokens.iter().zip(&tokens) {
            assert_eq!(labeled.pos_tag, token.pos_tag);
        }
    }
}
