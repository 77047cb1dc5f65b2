//! In-memory score oracle backed by a dense logit table.

use crate::error::{Error, Result};
use crate::index::{EntityId, RelationId};
use crate::oracle::ScoreOracle;
use crate::scores::{logit, Logits};
use ndarray::Array1;
use std::collections::HashMap;

/// A [`ScoreOracle`] over precomputed `(head, relation) -> [logit; N]` rows.
///
/// Rows that were never set score every tail with `default_logit`
/// (default: -10, i.e. a calibrated score of ~4.5e-5).
#[derive(Debug, Clone)]
pub struct ScoreTable {
    num_entities: usize,
    num_relations: usize,
    default_logit: f32,
    rows: HashMap<(EntityId, RelationId), Array1<f32>>,
}

impl ScoreTable {
    pub fn new(num_entities: usize, num_relations: usize) -> Self {
        Self {
            num_entities,
            num_relations,
            default_logit: -10.0,
            rows: HashMap::new(),
        }
    }

    pub fn with_default_logit(mut self, logit: f32) -> Self {
        self.default_logit = logit;
        self
    }

    /// Set the tail logits for `(head, relation)`.
    pub fn set_logits(
        &mut self,
        head: EntityId,
        relation: RelationId,
        logits: Vec<f32>,
    ) -> Result<()> {
        self.check_entity(head)?;
        self.check_relation(relation)?;
        if logits.len() != self.num_entities {
            return Err(Error::Validation(format!(
                "expected {} tail logits, got {}",
                self.num_entities,
                logits.len()
            )));
        }
        self.rows.insert((head, relation), Array1::from(logits));
        Ok(())
    }

    /// Set the row so that calibrated tail scores equal `probabilities`.
    pub fn set_probabilities(
        &mut self,
        head: EntityId,
        relation: RelationId,
        probabilities: &[f32],
    ) -> Result<()> {
        if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(Error::Validation(format!("probability {p} outside [0, 1]")));
        }
        self.set_logits(head, relation, probabilities.iter().map(|&p| logit(p)).collect())
    }
}

impl ScoreOracle for ScoreTable {
    fn num_entities(&self) -> usize {
        self.num_entities
    }

    fn num_relations(&self) -> usize {
        self.num_relations
    }

    fn predict_tails(&self, head: EntityId, relation: RelationId) -> Result<Logits> {
        self.check_entity(head)?;
        self.check_relation(relation)?;
        let row = match self.rows.get(&(head, relation)) {
            Some(row) => row.clone(),
            None => Array1::from_elem(self.num_entities, self.default_logit),
        };
        Ok(Logits::new(row))
    }

    fn score_triple(&self, head: EntityId, relation: RelationId, tail: EntityId) -> Result<f32> {
        self.check_entity(head)?;
        self.check_relation(relation)?;
        self.check_entity(tail)?;
        Ok(self
            .rows
            .get(&(head, relation))
            .map_or(self.default_logit, |row| row[tail.0]))
    }
}
