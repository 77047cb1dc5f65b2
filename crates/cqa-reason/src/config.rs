//! Algebra parameters for query answering.

use crate::norms::{NegationNorm, TNorm};
use crate::{ReasonError, Result};
use serde::{Deserialize, Serialize};

/// Fuzzy algebra and beam settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgebraConfig {
    /// Conjunction / disjunction kind (default: prod).
    pub tnorm: TNorm,
    /// Negation kind (default: standard).
    pub neg_norm: NegationNorm,
    /// Negation parameter (default: 0.0).
    pub lambda: f32,
    /// Beam width between hops (default: 10). Must be below the entity count.
    pub k: usize,
    /// Return the unsorted score vector instead of ranked answers.
    pub only_scores: bool,
}

impl Default for AlgebraConfig {
    fn default() -> Self {
        Self {
            tnorm: TNorm::Prod,
            neg_norm: NegationNorm::Standard,
            lambda: 0.0,
            k: 10,
            only_scores: false,
        }
    }
}

impl AlgebraConfig {
    pub fn with_tnorm(mut self, tnorm: TNorm) -> Self {
        self.tnorm = tnorm;
        self
    }

    pub fn with_neg_norm(mut self, neg_norm: NegationNorm) -> Self {
        self.neg_norm = neg_norm;
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_only_scores(mut self, only_scores: bool) -> Self {
        self.only_scores = only_scores;
        self
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ReasonError::InvalidConfig(e.to_string()))
    }

    /// Check the settings against a graph with `num_entities` entities.
    pub fn validate(&self, num_entities: usize) -> Result<()> {
        if self.k >= num_entities {
            return Err(ReasonError::InvalidConfig(format!(
                "beam width k = {} must be below the entity count {}",
                self.k, num_entities
            )));
        }
        self.neg_norm.validate_lambda(self.lambda)
    }
}
