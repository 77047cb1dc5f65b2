//! Fuzzy-logic connectives over calibrated scores.
//!
//! A t-norm T: \[0,1\] × \[0,1\] → \[0,1\] generalizes AND. It is
//! commutative, associative, monotone, and has 1 as identity
//! (T(a, 1) = a, T(a, 0) = 0). The matching t-conorm generalizes OR with 0 as
//! identity, and a negation norm generalizes NOT.
//!
//! | Kind | AND | OR |
//! |------|-----|----|
//! | `min` (Gödel) | min(a, b) | max(a, b) |
//! | `prod` | a · b | a + b − a · b |
//!
//! | Negation | N(a) | λ |
//! |----------|------|---|
//! | `standard` | 1 − a | unused |
//! | `sugeno` | (1 − a) / (1 + λa) | λ > −1 |
//! | `yager` | (1 − a^λ)^(1/λ) | λ > 0 |
//!
//! All operators assume inputs in \[0, 1\].

use crate::{ReasonError, Result};
use ndarray::{Array, ArrayBase, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conjunction (and its dual disjunction) kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TNorm {
    /// Gödel: min / max.
    Min,
    /// Product / probabilistic sum.
    #[default]
    Prod,
}

impl TNorm {
    /// Fuzzy AND of two scores.
    #[inline]
    pub fn conjoin(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Min => a.min(b),
            Self::Prod => a * b,
        }
    }

    /// Fuzzy OR of two scores (the t-conorm).
    #[inline]
    pub fn disjoin(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Min => a.max(b),
            // a + b - ab, written as 1 - (1-a)(1-b) so the result stays within [0, 1].
            Self::Prod => 1.0 - (1.0 - a) * (1.0 - b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for TNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TNorm {
    type Err = ReasonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min" => Ok(Self::Min),
            "prod" => Ok(Self::Prod),
            other => Err(ReasonError::InvalidConfig(format!(
                "unknown t-norm '{other}' (expected min or prod)"
            ))),
        }
    }
}

/// Fuzzy negation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegationNorm {
    #[default]
    Standard,
    Sugeno,
    Yager,
}

impl NegationNorm {
    /// Fuzzy NOT of a score. `lambda` must have passed [`validate_lambda`](Self::validate_lambda).
    #[inline]
    pub fn negate(self, a: f32, lambda: f32) -> f32 {
        match self {
            Self::Standard => 1.0 - a,
            Self::Sugeno => (1.0 - a) / (1.0 + lambda * a),
            Self::Yager => (1.0 - a.powf(lambda)).powf(1.0 / lambda),
        }
    }

    /// Reject λ values for which this negation is undefined on \[0, 1\].
    pub fn validate_lambda(self, lambda: f32) -> Result<()> {
        if !lambda.is_finite() {
            return Err(ReasonError::InvalidConfig(format!("lambda must be finite, got {lambda}")));
        }
        match self {
            Self::Standard => Ok(()),
            Self::Sugeno if lambda <= -1.0 => Err(ReasonError::InvalidConfig(format!(
                "sugeno negation requires lambda > -1, got {lambda}"
            ))),
            Self::Yager if lambda <= 0.0 => Err(ReasonError::InvalidConfig(format!(
                "yager negation requires lambda > 0, got {lambda}"
            ))),
            _ => Ok(()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Sugeno => "sugeno",
            Self::Yager => "yager",
        }
    }
}

impl fmt::Display for NegationNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NegationNorm {
    type Err = ReasonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(Self::Standard),
            "sugeno" => Ok(Self::Sugeno),
            "yager" => Ok(Self::Yager),
            other => Err(ReasonError::InvalidConfig(format!(
                "unknown negation norm '{other}' (expected standard, sugeno or yager)"
            ))),
        }
    }
}

/// Elementwise t-norm of two equally shaped arrays.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn t_norm<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>, kind: TNorm) -> Array<f32, D>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    Zip::from(a).and(b).map_collect(|&x, &y| kind.conjoin(x, y))
}

/// Elementwise t-conorm of two equally shaped arrays.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn t_conorm<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>, kind: TNorm) -> Array<f32, D>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    Zip::from(a).and(b).map_collect(|&x, &y| kind.disjoin(x, y))
}

/// Elementwise negation norm.
pub fn negation_norm<S, D>(a: &ArrayBase<S, D>, kind: NegationNorm, lambda: f32) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    a.mapv(|x| kind.negate(x, lambda))
}
