//! Missing-triple discovery.
//!
//! Sweeps `(entity, relation)` pairs and collects confidently predicted tails
//! that are not already known:
//!
//! ```text
//! { (e, r, x) | sigmoid(f(e, r, x)) >= confidence  ∧  (e, r, x) ∉ G }
//! ```

use crate::error::{Error, Result};
use crate::index::{EntityId, IdTriple, RelationId};
use crate::oracle::ScoreOracle;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Missing-triple discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingTripleConfig {
    /// Minimum calibrated score (default: 0.99).
    pub confidence: f32,
    /// Tails inspected per `(entity, relation)` pair (default: 10).
    pub topk: usize,
    /// Stop after this many triples (default: unbounded).
    pub at_most: usize,
    /// Restrict heads (None = every entity).
    pub entities: Option<Vec<EntityId>>,
    /// Restrict relations (None = every relation).
    pub relations: Option<Vec<RelationId>>,
}

impl Default for MissingTripleConfig {
    fn default() -> Self {
        Self {
            confidence: 0.99,
            topk: 10,
            at_most: usize::MAX,
            entities: None,
            relations: None,
        }
    }
}

impl MissingTripleConfig {
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_topk(mut self, topk: usize) -> Self {
        self.topk = topk;
        self
    }

    pub fn with_at_most(mut self, at_most: usize) -> Self {
        self.at_most = at_most;
        self
    }

    pub fn with_entities(mut self, entities: Vec<EntityId>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_relations(mut self, relations: Vec<RelationId>) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::Validation(format!(
                "confidence must be in [0, 1], got {}",
                self.confidence
            )));
        }
        if self.topk == 0 {
            return Err(Error::Validation("topk must be at least 1".into()));
        }
        Ok(())
    }
}

/// Find confidently predicted triples absent from `known`.
///
/// For each selected pair the top-k tails are visited best first; the sweep of
/// a pair stops at the first tail below `confidence`.
pub fn find_missing_triples<O: ScoreOracle + ?Sized>(
    oracle: &O,
    known: &HashSet<IdTriple>,
    config: &MissingTripleConfig,
) -> Result<BTreeSet<IdTriple>> {
    config.validate()?;

    let entities: Vec<EntityId> = match &config.entities {
        Some(selected) => selected.clone(),
        None => (0..oracle.num_entities()).map(EntityId).collect(),
    };
    let relations: Vec<RelationId> = match &config.relations {
        Some(selected) => selected.clone(),
        None => (0..oracle.num_relations()).map(RelationId).collect(),
    };
    tracing::info!(
        entities = entities.len(),
        relations = relations.len(),
        confidence = config.confidence,
        "searching for missing triples"
    );

    let mut found = BTreeSet::new();
    if config.at_most == 0 {
        return Ok(found);
    }
    for &head in &entities {
        for &relation in &relations {
            let scores = oracle.predict_tails(head, relation)?.calibrate()?;
            for (tail, score) in scores.top_k(config.topk) {
                if score < config.confidence {
                    break;
                }
                let triple = IdTriple::new(head, relation, tail);
                if known.contains(&triple) {
                    continue;
                }
                found.insert(triple);
                tracing::debug!(
                    head = head.0,
                    relation = relation.0,
                    tail = tail.0,
                    score,
                    "missing triple"
                );
                if found.len() >= config.at_most {
                    return Ok(found);
                }
            }
        }
    }
    tracing::info!(found = found.len(), "missing triple search finished");
    Ok(found)
}
