//! # cqa-reason
//!
//! Complex logical query answering over knowledge graph embeddings.
//!
//! A query starts from anchor entities and combines relation hops with
//! intersection (AND), union (OR) and negation (NOT). Each hop is scored by a
//! trained KGE model through [`cqa_kge::ScoreOracle`]; scores are combined with
//! fuzzy-logic connectives and multi-hop chains are kept tractable by beam
//! search (top-k pruning between hops).
//!
//! ## Pipeline
//!
//! ```text
//! tag + payload ──► QueryType ──► LogicalQuery ──► ScoreVector ──► ranked answers
//!                  (grammar)       (bind)          (eval, beam)     (rank)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cqa_kge::{EntityId, KgIndex, RelationId, ScoreTable};
//! use cqa_reason::{answer_query, AlgebraConfig, QueryTerm};
//!
//! let index = KgIndex::from_names(["A", "B", "C"], ["knows"]).unwrap();
//! let mut table = ScoreTable::new(3, 1);
//! table.set_probabilities(EntityId(0), RelationId(0), &[0.1, 0.9, 0.5]).unwrap();
//!
//! let query = QueryTerm::from_json(r#"["A", ["knows"]]"#).unwrap();
//! let config = AlgebraConfig::default().with_k(2);
//! let answer = answer_query(&table, &index, "1p", &query, &config).unwrap();
//! assert_eq!(answer.ranked().unwrap()[0].name, "B");
//! ```

pub mod beam;
pub mod bind;
pub mod config;
pub mod eval;
pub mod grammar;
pub mod norms;
pub mod oracle;
pub mod query;
pub mod rank;

pub use beam::Beam;
pub use bind::bind;
pub use config::AlgebraConfig;
pub use eval::BeamSearchReasoner;
pub use grammar::{classify, match_structure, QueryType, Shape, Symbol};
pub use norms::{negation_norm, t_conorm, t_norm, NegationNorm, TNorm};
pub use oracle::Scorer;
pub use query::{LogicalQuery, QueryTerm};
pub use rank::{rank, Answer};

use cqa_kge::{EntityId, KgIndex, ScoreOracle, ScoreVector};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during reasoning.
#[derive(Error, Debug)]
pub enum ReasonError {
    #[error("Unknown query type: {0}")]
    UnknownQueryType(String),
    #[error("Unknown query structure: {0}")]
    UnknownStructure(String),
    #[error("Malformed query: {0}")]
    MalformedQuery(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("KG error: {0}")]
    Kg(#[from] cqa_kge::Error),
}

/// Coarse error classes, for callers that only care which side is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad query type, payload, or algebra parameters. Raised before any model call.
    Configuration,
    /// Unknown entity or relation.
    Lookup,
    /// A score left \[0, 1\] where a probability was required.
    Numeric,
}

impl ReasonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Kg(e) if e.is_lookup() => ErrorKind::Lookup,
            Self::Kg(cqa_kge::Error::Numeric(_)) => ErrorKind::Numeric,
            _ => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReasonError>;

/// Unified interface for reasoning engines.
pub trait Reasoner {
    /// Score an entity as an answer to a logical query.
    fn score(&self, query: &LogicalQuery, entity: EntityId) -> Result<f32>;

    /// Predict the top-k entities that satisfy a logical query.
    fn predict(&self, query: &LogicalQuery, k: usize) -> Result<Vec<Answer>>;
}

/// Result of [`answer_query`]: ranked answers, or the raw per-entity scores
/// when `only_scores` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryAnswer {
    Ranked(Vec<Answer>),
    Scores(ScoreVector),
}

impl QueryAnswer {
    pub fn ranked(&self) -> Option<&[Answer]> {
        match self {
            Self::Ranked(answers) => Some(answers),
            Self::Scores(_) => None,
        }
    }

    pub fn scores(&self) -> Option<&ScoreVector> {
        match self {
            Self::Scores(scores) => Some(scores),
            Self::Ranked(_) => None,
        }
    }

    pub fn into_ranked(self) -> Option<Vec<Answer>> {
        match self {
            Self::Ranked(answers) => Some(answers),
            Self::Scores(_) => None,
        }
    }
}

/// Answer a complex query given as a type tag and a nested name payload.
///
/// Checks run in a fixed order, all before the first model call: algebra
/// parameters, query type, payload arity, then entity and relation names.
///
/// The beam width `k` is validated against the entity count for every query
/// type, including 1p where no beam is formed, so callers on small graphs must
/// lower `k` below the number of entities.
pub fn answer_query<O: ScoreOracle + ?Sized>(
    oracle: &O,
    index: &KgIndex,
    query_type: &str,
    query: &QueryTerm,
    config: &AlgebraConfig,
) -> Result<QueryAnswer> {
    BeamSearchReasoner::new(oracle, index, config.clone())?.answer(query_type, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ReasonError::UnknownQueryType("4p".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ReasonError::from(cqa_kge::Error::EntityNotFound("x".into())).kind(),
            ErrorKind::Lookup
        );
        assert_eq!(
            ReasonError::from(cqa_kge::Error::Numeric("nan".into())).kind(),
            ErrorKind::Numeric
        );
        assert_eq!(
            ReasonError::InvalidConfig("k".into()).kind(),
            ErrorKind::Configuration
        );
    }
}
