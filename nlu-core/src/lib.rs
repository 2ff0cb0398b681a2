//! # nlu-core — entity extraction pipeline for chatbot NLU
//!
//! This crate implements the supervised entity-annotation pipeline of a
//! conversational NLU system: character-span training annotations are turned
//! into per-token BIO labels, tokens are turned into context-window feature
//! sets for a discriminative sequence tagger, and predicted tag sequences are
//! decoded back into canonicalized entity values.
//!
//! ## Architecture
//!
//! Data flows through a linear pipeline; each stage is a separate module:
//!
//! 1. **Annotation** ([`annotator`]): an external tokenizer/POS tagger
//!    produces `(text, pos_tag)` tokens (trait seam, heuristic default).
//! 2. **Span alignment** ([`span`]): character-offset annotations are mapped
//!    onto token index ranges.
//! 3. **BIO encoding** ([`bio`]): tokens plus annotations become per-token
//!    `B-`/`I-`/`O` training records; bad annotations are skipped, recorded
//!    and logged, never fatal.
//! 4. **Feature extraction** ([`features`]): each token becomes an ordered
//!    list of string features from a sliding context window.
//! 5. **Sequence tagging** ([`model`]): a black-box model fits feature/label
//!    sequences and tags new ones (averaged perceptron built in).
//! 6. **Decoding** ([`decoder`]) and **canonicalization** ([`synonyms`]):
//!    predicted labels become an entity-name → value map.
//!
//! [`pipeline::ExtractorPipeline`] wires the stages together for training
//! runs and prediction requests.
//!
//! ## Example
//!
//! ```rust
//! use nlu_core::annotator::{Annotator, HeuristicAnnotator};
//! use nlu_core::decoder;
//! use nlu_core::features::FeatureExtractor;
//!
//! let tokens = HeuristicAnnotator.annotate("book a flight to paris tomorrow");
//! let features = FeatureExtractor::default().extract(&tokens);
//! assert_eq!(features.len(), tokens.len());
//! assert!(features[0].contains(&"BOS".to_string()));
//!
//! // Decoding a predicted label sequence back into entity values:
//! let texts: Vec<String> = tokens.into_iter().map(|t| t.text).collect();
//! let labels: Vec<String> = ["O", "O", "O", "O", "B-city", "O"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let entities = decoder::decode(&texts, &labels);
//! assert_eq!(entities["city"], "paris");
//! ```

pub mod annotator;
pub mod bio;
pub mod corpus;
pub mod decoder;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod span;
pub mod synonyms;

pub use annotator::{Annotator, HeuristicAnnotator, Token};
pub use bio::{Annotation, EncodedSentence, LabeledToken};
pub use decoder::EntityMap;
pub use error::{ExtractError, SpanError};
pub use features::{FeatureExtractor, FeatureSet};
pub use model::{AveragedPerceptron, ModelStore, SequenceModel};
pub use pipeline::{ExtractorPipeline, TrainingExample, TrainingReport};
pub use synonyms::SynonymTable;
