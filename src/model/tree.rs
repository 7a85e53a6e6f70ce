//! Entropy decision tree over binary symptom features.
//!
//! Used as the emergency fallback model when persisted artifacts cannot be
//! loaded, and as the persisted model format itself. Fitting is deterministic:
//! the per-node feature scan order comes from a seeded RNG and ties keep the
//! first feature in that order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::classifier::ProbabilisticModel;
use super::ModelError;

/// Gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        absent: Box<Node>,
        present: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    n_features: usize,
    n_classes: usize,
    root: Node,
}

struct Builder<'a> {
    x: &'a [Vec<f32>],
    y: &'a [usize],
    n_features: usize,
    n_classes: usize,
    params: TreeParams,
    rng: StdRng,
}

impl DecisionTree {
    /// Fit on binary feature rows `x` with encoded labels `y` in `0..n_classes`.
    pub fn fit(
        x: &[Vec<f32>],
        y: &[usize],
        n_classes: usize,
        params: TreeParams,
    ) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::Training("no training rows".into()));
        }
        if x.len() != y.len() {
            return Err(ModelError::Training(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(ModelError::Training("rows have differing widths".into()));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(ModelError::Training(format!(
                "label {bad} outside 0..{n_classes}"
            )));
        }

        let mut builder = Builder {
            x,
            y,
            n_features,
            n_classes,
            params,
            rng: StdRng::seed_from_u64(params.seed),
        };
        let root = builder.build((0..x.len()).collect(), 0);

        Ok(Self {
            n_features,
            n_classes,
            root,
        })
    }

    /// Number of leaves, for logging.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { absent, present, .. } => count(absent) + count(present),
            }
        }
        count(&self.root)
    }

    /// Structural check used after deserialization.
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        fn check(node: &Node, n_features: usize, n_classes: usize) -> Result<(), ModelError> {
            match node {
                Node::Leaf { proba } if proba.len() != n_classes => Err(ModelError::ShapeMismatch(
                    format!("leaf has {} classes, model declares {n_classes}", proba.len()),
                )),
                Node::Leaf { .. } => Ok(()),
                Node::Split { feature, .. } if *feature >= n_features => Err(
                    ModelError::ShapeMismatch(format!("split on feature {feature} of {n_features}")),
                ),
                Node::Split { absent, present, .. } => {
                    check(absent, n_features, n_classes)?;
                    check(present, n_features, n_classes)
                }
            }
        }
        check(&self.root, self.n_features, self.n_classes)
    }
}

impl Builder<'_> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> Node {
        let counts = self.class_counts(&rows);
        let total = rows.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || total < self.params.min_samples_split {
            return self.leaf(&counts, total);
        }

        let parent_entropy = entropy(&counts, total);
        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(&mut self.rng);

        let mut best: Option<(usize, f64)> = None;
        for feature in order {
            let mut present = vec![0usize; self.n_classes];
            let mut n_present = 0usize;
            for &r in &rows {
                if self.x[r][feature] > 0.5 {
                    present[self.y[r]] += 1;
                    n_present += 1;
                }
            }
            let n_absent = total - n_present;
            if n_present == 0 || n_absent == 0 {
                continue;
            }
            let absent: Vec<usize> = counts.iter().zip(&present).map(|(c, p)| c - p).collect();

            let child_entropy = (n_present as f64 / total as f64) * entropy(&present, n_present)
                + (n_absent as f64 / total as f64) * entropy(&absent, n_absent);
            let gain = parent_entropy - child_entropy;

            if gain > MIN_GAIN && best.map_or(true, |(_, g)| gain > g + MIN_GAIN) {
                best = Some((feature, gain));
            }
        }

        let Some((feature, _)) = best else {
            return self.leaf(&counts, total);
        };

        let (present_rows, absent_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| self.x[r][feature] > 0.5);

        Node::Split {
            feature,
            absent: Box::new(self.build(absent_rows, depth + 1)),
            present: Box::new(self.build(present_rows, depth + 1)),
        }
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &r in rows {
            counts[self.y[r]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], total: usize) -> Node {
        let proba = counts
            .iter()
            .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect();
        Node::Leaf { proba }
    }
}

fn entropy(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

impl ProbabilisticModel for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { proba } => return Ok(proba.clone()),
                Node::Split {
                    feature,
                    absent,
                    present,
                } => {
                    node = if features[*feature] > 0.5 { present } else { absent };
                }
            }
        }
    }
}
