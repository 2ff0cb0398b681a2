//! # Sequence model seam and storage
//!
//! The tagging model is a black box to the rest of the pipeline, consumed
//! through two operations only: fit a model from parallel feature/label
//! sequences, and tag a feature sequence with labels of the same length.
//! [`SequenceModel`] is that seam; [`ModelStore`] resolves model ids to the
//! `<id>.model` artifacts under a configured storage root.
//!
//! [`AveragedPerceptron`] is the built-in implementation: an averaged
//! perceptron tagger over the extracted string features. It is online,
//! mistake-driven, and uses lazy averaging so the running average costs
//! O(active features) per step instead of O(all features).

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bio::OUTSIDE;
use crate::error::ExtractError;
use crate::features::FeatureSet;

/// The external sequence-labeling model contract.
///
/// `tag` must return exactly one label per input feature set; the
/// orchestrator treats any deviation as a hard alignment error.
pub trait SequenceModel: Send + Sync + Sized + 'static {
    /// Train a model from parallel feature and label sequences.
    fn fit(features: &[Vec<FeatureSet>], labels: &[Vec<String>]) -> Self;

    /// Predict one label per feature set.
    fn tag(&self, features: &[FeatureSet]) -> Vec<String>;

    /// Persist the model artifact.
    fn save(&self, path: &Path) -> Result<(), ExtractError>;

    /// Open a persisted model artifact.
    fn load(path: &Path) -> Result<Self, ExtractError>;
}

/// Resolves model ids to artifact paths under a storage root.
///
/// One artifact per model id, named `<id>.model`, format owned by the model
/// implementation. Ids arriving over HTTP are untrusted, so anything that
/// could escape the root is rejected.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact path for a model id. Ids are restricted to
    /// `[A-Za-z0-9_-]+`.
    pub fn path_for(&self, model_id: &str) -> Result<PathBuf, ExtractError> {
        let valid = !model_id.is_empty()
            && model_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ExtractError::InvalidModelId(model_id.to_string()));
        }
        Ok(self.root.join(format!("{model_id}.model")))
    }

    /// Whether a persisted artifact exists for this id.
    pub fn exists(&self, model_id: &str) -> bool {
        self.path_for(model_id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Create the storage root if missing.
    pub fn ensure_root(&self) -> Result<(), ExtractError> {
        fs::create_dir_all(&self.root).map_err(|e| ExtractError::io(&self.root, e))
    }
}

/// Training passes over the dataset. Small datasets need several passes for
/// the averaged weights to settle.
const EPOCHS: usize = 20;

/// Averaged perceptron sequence tagger keyed on feature strings.
///
/// Each token is classified independently: the score of a tag is the sum of
/// the weights of the token's active features for that tag, and the argmax
/// wins (ties broken by tag order, which is sorted and therefore stable).
/// The persisted weights are the per-step averages, which are much less
/// sensitive to the order of training updates than the final raw weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AveragedPerceptron {
    /// feature → tag → averaged weight. Nested maps rather than tuple keys
    /// so the artifact serializes as plain JSON objects.
    weights: HashMap<String, HashMap<String, f64>>,
    /// Known tags, sorted.
    tags: Vec<String>,
}

impl AveragedPerceptron {
    fn score(&self, features: &FeatureSet, tag: &str) -> f64 {
        features
            .iter()
            .filter_map(|f| self.weights.get(f)?.get(tag))
            .sum()
    }

    fn best_tag(&self, features: &FeatureSet) -> String {
        let mut best: Option<(&str, f64)> = None;
        for tag in &self.tags {
            let score = self.score(features, tag);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((tag, score));
            }
        }
        best.map(|(t, _)| t.to_string())
            .unwrap_or_else(|| OUTSIDE.to_string())
    }
}

impl SequenceModel for AveragedPerceptron {
    fn fit(features: &[Vec<FeatureSet>], labels: &[Vec<String>]) -> Self {
        let tags: Vec<String> = labels
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut trainer = Trainer::new(tags);
        for _ in 0..EPOCHS {
            for (sentence, sentence_labels) in features.iter().zip(labels) {
                for (token_features, truth) in sentence.iter().zip(sentence_labels) {
                    trainer.step(token_features, truth);
                }
            }
        }
        trainer.finalize()
    }

    fn tag(&self, features: &[FeatureSet]) -> Vec<String> {
        features.iter().map(|fv| self.best_tag(fv)).collect()
    }

    fn save(&self, path: &Path) -> Result<(), ExtractError> {
        let artifact = serde_json::to_string(self)?;
        fs::write(path, artifact).map_err(|e| ExtractError::io(path, e))
    }

    fn load(path: &Path) -> Result<Self, ExtractError> {
        let raw = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Mutable training state, separate from the read-only published model.
struct Trainer {
    weights: HashMap<String, HashMap<String, f64>>,
    /// Accumulated weight-steps for averaging.
    totals: HashMap<String, HashMap<String, f64>>,
    /// Step at which each weight last changed (for lazy averaging).
    last_update: HashMap<String, HashMap<String, usize>>,
    steps: usize,
    tags: Vec<String>,
}

impl Trainer {
    fn new(tags: Vec<String>) -> Self {
        Self {
            weights: HashMap::new(),
            totals: HashMap::new(),
            last_update: HashMap::new(),
            steps: 0,
            tags,
        }
    }

    fn predict(&self, features: &FeatureSet) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for tag in &self.tags {
            let score: f64 = features
                .iter()
                .filter_map(|f| self.weights.get(f)?.get(tag))
                .sum();
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((tag, score));
            }
        }
        best.map(|(t, _)| t)
    }

    /// One online step: predict with the raw weights, update on mistakes.
    fn step(&mut self, features: &FeatureSet, truth: &str) {
        let predicted = self.predict(features).map(str::to_string);
        if predicted.as_deref() != Some(truth) {
            let predicted = predicted.unwrap_or_default();
            for feature in features {
                self.bump(feature, truth, 1.0);
                if !predicted.is_empty() {
                    self.bump(feature, &predicted, -1.0);
                }
            }
        }
        self.steps += 1;
    }

    /// Lazy averaging: settle the accumulated total for this weight up to the
    /// current step, then apply the delta.
    fn bump(&mut self, feature: &str, tag: &str, delta: f64) {
        let weight = self
            .weights
            .entry(feature.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_insert(0.0);
        let last = self
            .last_update
            .entry(feature.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_insert(0);
        let total = self
            .totals
            .entry(feature.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_insert(0.0);

        *total += (self.steps - *last) as f64 * *weight;
        *last = self.steps;
        *weight += delta;
    }

    /// Flush every pending total and publish the averaged weights.
    fn finalize(mut self) -> AveragedPerceptron {
        let steps = self.steps.max(1) as f64;
        let mut averaged: HashMap<String, HashMap<String, f64>> = HashMap::new();

        for (feature, tag_weights) in &self.weights {
            for (tag, weight) in tag_weights {
                let last = self
                    .last_update
                    .get(feature)
                    .and_then(|m| m.get(tag))
                    .copied()
                    .unwrap_or(0);
                let total = self
                    .totals
                    .get(feature)
                    .and_then(|m| m.get(tag))
                    .copied()
                    .unwrap_or(0.0)
                    + (self.steps - last) as f64 * weight;
                averaged
                    .entry(feature.clone())
                    .or_default()
                    .insert(tag.clone(), total / steps);
            }
        }

        self.weights = averaged;
        AveragedPerceptron {
            weights: self.weights,
            tags: self.tags,
        }
    }
}
