//! Score vectors and calibration.
//!
//! # Raw vs Calibrated
//!
//! KGE models emit unbounded plausibility scores (logits). Fuzzy-logic
//! operators are only defined on the unit interval, so the two are kept as
//! distinct types:
//!
//! | Type | Range | Produced by |
//! |------|-------|-------------|
//! | [`Logits`] | (-∞, +∞) | [`ScoreOracle`](crate::ScoreOracle) |
//! | [`ScoreVector`] | \[0, 1\] | [`Logits::calibrate`] (logistic sigmoid) |
//!
//! A [`ScoreVector`] can only be built through a checked constructor, so
//! un-squashed logits never reach a t-norm or negation.

use crate::error::{Error, Result};
use crate::index::EntityId;
use ndarray::{Array1, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Rounding slack tolerated at the unit-interval boundary.
pub const PROBABILITY_EPSILON: f32 = 1e-5;

/// Logistic sigmoid: 1 / (1 + e^-x).
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse of [`sigmoid`]: ln(p / (1 - p)). Maps 0 and 1 to ∓∞.
#[inline]
pub fn logit(p: f32) -> f32 {
    (p / (1.0 - p)).ln()
}

/// Check that every value is a probability, clamping rounding noise.
pub fn check_probabilities<S, D>(values: &mut ArrayBase<S, D>) -> Result<()>
where
    S: ndarray::DataMut<Elem = f32>,
    D: Dimension,
{
    for v in values.iter_mut() {
        if v.is_nan() || *v < -PROBABILITY_EPSILON || *v > 1.0 + PROBABILITY_EPSILON {
            return Err(Error::Numeric(format!(
                "score {v} outside [0, 1]; calibrate logits before combining"
            )));
        }
        *v = v.clamp(0.0, 1.0);
    }
    Ok(())
}

/// Raw (uncalibrated) model outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logits(pub Array1<f32>);

impl Logits {
    pub fn new(values: Array1<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }

    /// Squash into \[0, 1\] with the logistic sigmoid.
    ///
    /// Fails with [`Error::Numeric`] if the model produced NaN.
    pub fn calibrate(&self) -> Result<ScoreVector> {
        ScoreVector::from_probabilities(self.0.mapv(sigmoid))
    }
}

/// Calibrated scores in \[0, 1\], one per entity, indexed by [`EntityId`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreVector(Array1<f32>);

impl ScoreVector {
    /// Wrap probabilities, rejecting NaN and values outside \[0, 1\].
    pub fn from_probabilities(mut values: Array1<f32>) -> Result<Self> {
        check_probabilities(&mut values)?;
        Ok(Self(values))
    }

    /// All-zero vector (no entity satisfies the query).
    pub fn zeros(len: usize) -> Self {
        Self(Array1::zeros(len))
    }

    /// Crisp indicator vector of a single entity.
    pub fn one_hot(len: usize, entity: EntityId) -> Result<Self> {
        if entity.0 >= len {
            return Err(Error::EntityIdOutOfRange { id: entity.0, len });
        }
        let mut values = Array1::zeros(len);
        values[entity.0] = 1.0;
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, entity: EntityId) -> Option<f32> {
        self.0.get(entity.0).copied()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }

    pub fn into_inner(self) -> Array1<f32> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, f32)> + '_ {
        self.0.iter().enumerate().map(|(i, &s)| (EntityId(i), s))
    }

    /// Highest score, or `None` for an empty vector.
    pub fn max(&self) -> Option<f32> {
        self.0.iter().copied().reduce(f32::max)
    }

    /// Top `k` entries by score, descending.
    ///
    /// Equal scores keep ascending id order, so results are reproducible.
    pub fn top_k(&self, k: usize) -> Vec<(EntityId, f32)> {
        top_k(&self.0, k)
            .into_iter()
            .map(|(i, s)| (EntityId(i), s))
            .collect()
    }
}

/// Top `k` (position, value) pairs, descending, lower position first on ties.
pub fn top_k<S>(values: &ArrayBase<S, ndarray::Ix1>, k: usize) -> Vec<(usize, f32)>
where
    S: Data<Elem = f32>,
{
    let mut entries: Vec<(usize, f32)> = values.iter().copied().enumerate().collect();
    // Stable sort on a total order: ties stay in ascending position order.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(k);
    entries
}

/// Link prediction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted entity or relation name.
    pub name: String,
    /// Dense id of the predicted item (entity or relation, per query).
    pub id: usize,
    /// Calibrated score (higher = more plausible).
    pub score: f32,
}
