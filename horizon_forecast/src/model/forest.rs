//! Random forest regressor stored as flat decision-tree node arrays

use crate::error::{ForecastError, Result};
use crate::model::Regressor;
use serde::{Deserialize, Serialize};

/// Marker for "no child" in `children_left`/`children_right`
pub const LEAF: i64 = -1;

/// One regression tree in array form.
///
/// Node `i` splits on `feature[i] <= threshold[i]` and goes to
/// `children_left[i]` when true, `children_right[i]` otherwise. A node whose
/// left child is [`LEAF`] is a leaf predicting `value[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    /// Tree with a single leaf
    pub fn constant(value: f64) -> Self {
        Self {
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![LEAF],
            threshold: vec![0.0],
            value: vec![value],
        }
    }

    fn validate(&self) -> Result<()> {
        let n = self.value.len();
        if n == 0
            || self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err(ForecastError::InvalidParameter(
                "Tree node arrays must be non-empty and equally long".to_string(),
            ));
        }
        Ok(())
    }

    /// Walk from the root to a leaf
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let mut node = 0usize;

        // A well-formed tree reaches a leaf in fewer hops than it has nodes
        for _ in 0..=self.value.len() {
            let left = *self.children_left.get(node).ok_or_else(|| {
                ForecastError::Computation(format!("Tree node {} does not exist", node))
            })?;
            if left == LEAF {
                return self.value.get(node).copied().ok_or_else(|| {
                    ForecastError::Computation(format!("Tree leaf {} has no value", node))
                });
            }

            let (Some(&feature), Some(&threshold), Some(&right)) = (
                self.feature.get(node),
                self.threshold.get(node),
                self.children_right.get(node),
            ) else {
                return Err(ForecastError::Computation(format!(
                    "Tree node {} is incomplete",
                    node
                )));
            };

            let feature = usize::try_from(feature).map_err(|_| {
                ForecastError::Computation(format!("Tree node {} has no split feature", node))
            })?;
            let x = *row.get(feature).ok_or_else(|| {
                ForecastError::Computation(format!(
                    "Tree splits on feature {} but the row has {}",
                    feature,
                    row.len()
                ))
            })?;

            let next = if x <= threshold { left } else { right };
            node = usize::try_from(next).map_err(|_| {
                ForecastError::Computation(format!("Tree node {} has a missing child", node))
            })?;
        }

        Err(ForecastError::Computation(
            "Tree contains a cycle".to_string(),
        ))
    }

    /// Highest feature index any split uses, plus one
    fn feature_span(&self) -> usize {
        self.feature
            .iter()
            .filter_map(|&f| usize::try_from(f).ok())
            .map(|f| f + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Mean of several regression trees.
///
/// Deserialising goes through [`ForestRegressor::new`], so a bundle with
/// malformed trees fails to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForestParts")]
pub struct ForestRegressor {
    pub trees: Vec<RegressionTree>,
}

#[derive(Deserialize)]
struct ForestParts {
    trees: Vec<RegressionTree>,
}

impl TryFrom<ForestParts> for ForestRegressor {
    type Error = ForecastError;

    fn try_from(parts: ForestParts) -> Result<Self> {
        Self::new(parts.trees)
    }
}

impl ForestRegressor {
    /// Create a new forest
    pub fn new(trees: Vec<RegressionTree>) -> Result<Self> {
        if trees.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Forest needs at least one tree".to_string(),
            ));
        }
        for tree in &trees {
            tree.validate()?;
        }
        Ok(Self { trees })
    }
}

impl Regressor for ForestRegressor {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::Computation("Forest has no trees".to_string()));
        }

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.trees
            .iter()
            .map(RegressionTree::feature_span)
            .max()
            .unwrap_or(0)
    }

    fn name(&self) -> &str {
        "forest"
    }
}
