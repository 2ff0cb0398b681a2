//! # Training / prediction orchestration
//!
//! [`ExtractorPipeline`] sequences the pipeline stages around the external
//! collaborators (the linguistic annotator and the sequence model):
//!
//! - **Training**: annotated examples → BIO encoding → feature extraction →
//!   model fit → persisted artifact. A feature/label length mismatch for any
//!   sentence aborts the whole batch; sentences are never silently dropped
//!   (only individual bad *annotations* are, inside the encoder).
//! - **Prediction**: raw text → annotator → feature extraction → model tag →
//!   label decoding → synonym resolution → entity map.
//!
//! Every call is a self-contained, stateless computation over its own input.
//! The only shared state is the read-only synonym table and the model cache:
//! opening a persisted artifact is the dominant latency cost of inference, so
//! models are loaded once per id and reused across requests behind a
//! `RwLock`. Serializing concurrent training runs against the same model id
//! is the caller's responsibility.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::annotator::Annotator;
use crate::bio::{self, Annotation};
use crate::decoder::{self, EntityMap};
use crate::error::ExtractError;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::model::{AveragedPerceptron, ModelStore, SequenceModel};
use crate::synonyms::SynonymTable;

/// One annotated training example: raw text plus character-span entities.
/// This is the JSON shape training data arrives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Annotation>,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, entities: Vec<Annotation>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }
}

/// Outcome of a training run: what was fitted and what was dropped on the
/// way. Skipped annotations are per-annotation recoveries inside the BIO
/// encoder; everything else either trained or failed the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub model_id: String,
    pub sentences: usize,
    pub skipped_annotations: usize,
}

/// The entity-extraction pipeline, generic over the sequence model.
///
/// Pure stages (features, decoding, synonyms) hold no mutable state, so one
/// pipeline instance serves concurrent predictions. Collaborators are
/// injected at construction; there are no global registries.
pub struct ExtractorPipeline<M: SequenceModel = AveragedPerceptron> {
    annotator: Box<dyn Annotator>,
    features: FeatureExtractor,
    synonyms: SynonymTable,
    store: ModelStore,
    cache: RwLock<HashMap<String, Arc<M>>>,
}

impl<M: SequenceModel> ExtractorPipeline<M> {
    pub fn new(annotator: Box<dyn Annotator>, store: ModelStore) -> Self {
        Self {
            annotator,
            features: FeatureExtractor::default(),
            synonyms: SynonymTable::new(),
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the synonym table (load-once, before serving).
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Replace the feature extractor (e.g. a wider context window).
    pub fn with_features(mut self, features: FeatureExtractor) -> Self {
        self.features = features;
        self
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Train a model from a batch of annotated examples and persist it under
    /// `model_id`.
    pub fn train(
        &self,
        examples: &[TrainingExample],
        model_id: &str,
    ) -> Result<TrainingReport, ExtractError> {
        let path = self.store.path_for(model_id)?;
        if examples.is_empty() {
            return Err(ExtractError::TrainingData(
                "empty training batch".to_string(),
            ));
        }

        // Dataset preparation is embarrassingly parallel: each sentence is
        // encoded and featurized independently. Any malformed example fails
        // the whole batch.
        let prepared: Vec<(Vec<FeatureSet>, Vec<String>, usize)> = examples
            .par_iter()
            .map(|example| self.prepare_example(example))
            .collect::<Result<_, _>>()?;

        let mut features = Vec::with_capacity(prepared.len());
        let mut labels = Vec::with_capacity(prepared.len());
        let mut skipped_annotations = 0;
        for (f, l, skipped) in prepared {
            features.push(f);
            labels.push(l);
            skipped_annotations += skipped;
        }

        let model = M::fit(&features, &labels);
        self.store.ensure_root()?;
        model.save(&path)?;

        // Republish: the next prediction must see the new artifact, not a
        // stale cache entry.
        self.cache
            .write()
            .expect("model cache poisoned")
            .insert(model_id.to_string(), Arc::new(model));

        let report = TrainingReport {
            model_id: model_id.to_string(),
            sentences: examples.len(),
            skipped_annotations,
        };
        info!(
            model_id,
            sentences = report.sentences,
            skipped = report.skipped_annotations,
            "trained entity model"
        );
        Ok(report)
    }

    /// Extract entities from raw text using the model persisted under
    /// `model_id`.
    pub fn predict(&self, text: &str, model_id: &str) -> Result<EntityMap, ExtractError> {
        let tokens = self.annotator.annotate(text);
        if tokens.is_empty() {
            return Ok(EntityMap::new());
        }

        let features = self.features.extract(&tokens);
        let model = self.model(model_id)?;
        let predicted = model.tag(&features);
        if predicted.len() != tokens.len() {
            return Err(ExtractError::LabelAlignment {
                expected: tokens.len(),
                actual: predicted.len(),
            });
        }

        let texts: Vec<String> = tokens.into_iter().map(|t| t.text).collect();
        let entities = decoder::decode(&texts, &predicted);
        debug!(model_id, entities = entities.len(), "prediction complete");
        Ok(self.synonyms.resolve(entities))
    }

    /// BIO-encode and featurize one training example.
    fn prepare_example(
        &self,
        example: &TrainingExample,
    ) -> Result<(Vec<FeatureSet>, Vec<String>, usize), ExtractError> {
        let tokens = self.annotator.annotate(&example.text);
        if tokens.is_empty() {
            return Err(ExtractError::TrainingData(format!(
                "example {:?} produced no tokens",
                example.text
            )));
        }

        let encoded = bio::encode(&example.text, &tokens, &example.entities);
        let features = self.features.extract(&tokens);
        let labels = encoded.labels();
        if features.len() != labels.len() {
            return Err(ExtractError::TrainingData(format!(
                "{} feature sets for {} labels in example {:?}",
                features.len(),
                labels.len(),
                example.text
            )));
        }
        Ok((features, labels, encoded.skipped.len()))
    }

    /// Cached model handle for `model_id`, loading the artifact on first use.
    fn model(&self, model_id: &str) -> Result<Arc<M>, ExtractError> {
        if let Some(model) = self
            .cache
            .read()
            .expect("model cache poisoned")
            .get(model_id)
        {
            return Ok(Arc::clone(model));
        }

        let path = self.store.path_for(model_id)?;
        if !path.is_file() {
            return Err(ExtractError::ModelNotFound(model_id.to_string()));
        }
        let model = Arc::new(M::load(&path)?);

        let mut cache = self.cache.write().expect("model cache poisoned");
        // A racing loader may have beaten us; keep whichever is already
        // published so every reader sees one handle.
        let entry = cache
            .entry(model_id.to_string())
            .or_insert_with(|| Arc::clone(&model));
        Ok(Arc::clone(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::HeuristicAnnotator;

    fn pipeline(dir: &std::path::Path) -> ExtractorPipeline {
        ExtractorPipeline::new(Box::new(HeuristicAnnotator), ModelStore::new(dir))
    }

    fn travel_examples() -> Vec<TrainingExample> {
        vec![
            TrainingExample::new(
                "book a flight to paris tomorrow",
                vec![Annotation::new("city", 17, 22)],
            ),
            TrainingExample::new(
                "fly me to london please",
                vec![Annotation::new("city", 10, 16)],
            ),
            TrainingExample::new("i want to cancel my booking", vec![]),
        ]
    }

    #[test]
    fn test_train_reports_batch_shape() {
        let dir = tempfile::tempdir().unwrap();
        let report = pipeline(dir.path())
            .train(&travel_examples(), "travel")
            .unwrap();
        assert_eq!(report.sentences, 3);
        assert_eq!(report.skipped_annotations, 0);
    }

    #[test]
    fn test_train_counts_skipped_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let mut examples = travel_examples();
        examples[0]
            .entities
            .push(Annotation::new("broken", 900, 950));
        let report = pipeline(dir.path()).train(&examples, "travel").unwrap();
        assert_eq!(report.skipped_annotations, 1);
    }

    #[test]
    fn test_train_persists_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        p.train(&travel_examples(), "travel").unwrap();
        assert!(p.store().exists("travel"));
    }

    #[test]
    fn test_empty_batch_is_training_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(dir.path()).train(&[], "travel").unwrap_err();
        assert!(matches!(err, ExtractError::TrainingData(_)));
    }

    #[test]
    fn test_tokenless_example_fails_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut examples = travel_examples();
        examples.push(TrainingExample::new("   ", vec![]));
        let err = pipeline(dir.path()).train(&examples, "travel").unwrap_err();
        assert!(matches!(err, ExtractError::TrainingData(_)));
    }

    #[test]
    fn test_predict_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(dir.path())
            .predict("book a flight", "missing")
            .unwrap_err();
        assert!(matches!(err, ExtractError::ModelNotFound(_)));
    }

    #[test]
    fn test_predict_empty_text_skips_the_model() {
        let dir = tempfile::tempdir().unwrap();
        // No model was ever trained; an empty input must still succeed.
        let entities = pipeline(dir.path()).predict("   ", "missing").unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn test_invalid_model_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(dir.path())
            .predict("book a flight", "../escape")
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidModelId(_)));
    }
}
