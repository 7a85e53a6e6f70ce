//! Diagnostic classification: feature vector construction, model call and
//! candidate ranking.
//!
//! The model is an opaque `ProbabilisticModel`. Ranking keeps the top
//! candidates above a percentage floor, ties in class-index order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::loader::ClassifierState;
use super::ModelError;
use crate::knowledge::topic_key;

/// A trained multi-class probabilistic model.
///
/// Implementations must be safe for concurrent read-only use: many requests
/// call `predict_proba` on the same instance at once.
pub trait ProbabilisticModel: Send + Sync {
    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// One probability per class, in class-index order.
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, ModelError>;
}

/// A ranked diagnosis candidate. `probability` is a percentage in (0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub topic_key: String,
    pub label: String,
    pub probability: f64,
}

/// Outcome of one classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Prediction {
    /// Nothing to classify, or nothing cleared the confidence floor.
    NoPrediction,
    /// Non-empty, descending by probability. First entry is the primary candidate.
    Ranked { candidates: Vec<Candidate> },
    /// The model failed to load at startup (or failed at inference time).
    Unavailable { reason: String },
}

impl Prediction {
    pub fn is_usable(&self) -> bool {
        matches!(self, Prediction::Ranked { candidates } if !candidates.is_empty())
    }

    pub fn primary(&self) -> Option<&Candidate> {
        match self {
            Prediction::Ranked { candidates } => candidates.first(),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Prediction::Ranked { candidates } => candidates,
            _ => &[],
        }
    }
}

/// How raw class probabilities become candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingPolicy {
    pub max_candidates: usize,
    /// Percentage a candidate must strictly exceed.
    pub floor_pct: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            floor_pct: 5.0,
        }
    }
}

/// Ranks candidate conditions for a detected feature set against the
/// process-wide classifier state.
#[derive(Clone)]
pub struct DiagnosticClassifier {
    state: Arc<ClassifierState>,
    policy: RankingPolicy,
}

impl DiagnosticClassifier {
    pub fn new(state: Arc<ClassifierState>, policy: RankingPolicy) -> Self {
        Self { state, policy }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Build the model input: 1.0 for each detected feature the model knows,
    /// 0.0 elsewhere. Returns `None` when no detected feature is in the model's
    /// vocabulary.
    pub fn feature_vector(&self, detected: &[String]) -> Option<Vec<f32>> {
        let order = self.state.feature_order();
        let mut vector = vec![0.0f32; order.len()];
        let mut hits = 0usize;
        for feature in detected {
            match order.position(feature) {
                Some(i) => {
                    vector[i] = 1.0;
                    hits += 1;
                }
                None => tracing::debug!(feature = %feature, "Feature not in model vocabulary, dropped"),
            }
        }
        (hits > 0).then_some(vector)
    }

    pub fn predict(&self, detected: &[String]) -> Prediction {
        let Some(model) = self.state.model() else {
            let reason = self
                .state
                .last_error()
                .unwrap_or("model unavailable")
                .to_string();
            return Prediction::Unavailable { reason };
        };

        if detected.is_empty() {
            return Prediction::NoPrediction;
        }
        let Some(vector) = self.feature_vector(detected) else {
            return Prediction::NoPrediction;
        };

        let probas = match model.predict_proba(&vector) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Classifier inference failed");
                return Prediction::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        let candidates = rank(&probas, self.policy, |idx| {
            self.state.encoder().inverse_transform(idx).map(str::to_string)
        });

        if candidates.is_empty() {
            tracing::debug!(features = detected.len(), "No candidate cleared the confidence floor");
            Prediction::NoPrediction
        } else {
            Prediction::Ranked { candidates }
        }
    }
}

/// Top-`max_candidates` indices by probability, descending, keeping only those
/// above the floor. Equal probabilities keep ascending index order.
fn rank<F>(probas: &[f64], policy: RankingPolicy, label_of: F) -> Vec<Candidate>
where
    F: Fn(usize) -> Option<String>,
{
    let mut order: Vec<usize> = (0..probas.len()).collect();
    order.sort_by(|&a, &b| {
        probas[b]
            .partial_cmp(&probas[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    order
        .into_iter()
        .take(policy.max_candidates)
        .filter_map(|idx| {
            let pct = probas[idx] * 100.0;
            if !(pct > policy.floor_pct) {
                return None;
            }
            let Some(label) = label_of(idx) else {
                tracing::warn!(class = idx, "Class index missing from label encoder");
                return None;
            };
            Some(Candidate {
                topic_key: topic_key(&label),
                label,
                probability: pct.min(100.0),
            })
        })
        .collect()
}
