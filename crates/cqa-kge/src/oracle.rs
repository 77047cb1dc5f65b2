//! The single-hop scoring interface of a trained embedding model.

use crate::error::{Error, Result};
use crate::index::{EntityId, RelationId};
use crate::scores::Logits;
use ndarray::{Array1, Array2};

/// Read-only link prediction over a trained KGE model.
///
/// Implementations return raw logits; calibration happens on the caller side
/// (see [`Logits::calibrate`]). Implementations must be safe to call
/// repeatedly with no side effects: the query engine issues one call per
/// beam entity per hop.
///
/// Only [`predict_tails`](Self::predict_tails) and
/// [`score_triple`](Self::score_triple) are required. The other prediction
/// directions have default implementations built on `score_triple`.
pub trait ScoreOracle {
    /// Number of entities (length of every tail score vector).
    fn num_entities(&self) -> usize;

    /// Number of relations.
    fn num_relations(&self) -> usize;

    /// Logits of (head, relation, t) for every entity t.
    fn predict_tails(&self, head: EntityId, relation: RelationId) -> Result<Logits>;

    /// Logit of a single triple.
    fn score_triple(&self, head: EntityId, relation: RelationId, tail: EntityId) -> Result<f32>;

    /// Logits of (h, relation, tail) for every entity h.
    fn predict_heads(&self, relation: RelationId, tail: EntityId) -> Result<Logits> {
        let scores = (0..self.num_entities())
            .map(|h| self.score_triple(EntityId(h), relation, tail))
            .collect::<Result<Vec<f32>>>()?;
        Ok(Logits::new(Array1::from(scores)))
    }

    /// Logits of (head, r, tail) for every relation r.
    fn predict_relations(&self, head: EntityId, tail: EntityId) -> Result<Logits> {
        let scores = (0..self.num_relations())
            .map(|r| self.score_triple(head, RelationId(r), tail))
            .collect::<Result<Vec<f32>>>()?;
        Ok(Logits::new(Array1::from(scores)))
    }

    /// Tail logits for several heads under one relation, one row per head.
    ///
    /// The default issues one [`predict_tails`](Self::predict_tails) call per
    /// head. Backends with a batched forward pass should override it.
    fn predict_tails_batch(&self, heads: &[EntityId], relation: RelationId) -> Result<Array2<f32>> {
        let n = self.num_entities();
        let mut rows = Array2::zeros((heads.len(), n));
        for (mut row, &head) in rows.outer_iter_mut().zip(heads) {
            let logits = self.predict_tails(head, relation)?;
            if logits.len() != n {
                return Err(Error::Validation(format!(
                    "oracle returned {} scores for {} entities",
                    logits.len(),
                    n
                )));
            }
            row.assign(logits.as_array());
        }
        Ok(rows)
    }

    /// Fail with a lookup error if `entity` is not a known id.
    fn check_entity(&self, entity: EntityId) -> Result<()> {
        if entity.0 >= self.num_entities() {
            return Err(Error::EntityIdOutOfRange {
                id: entity.0,
                len: self.num_entities(),
            });
        }
        Ok(())
    }

    /// Fail with a lookup error if `relation` is not a known id.
    fn check_relation(&self, relation: RelationId) -> Result<()> {
        if relation.0 >= self.num_relations() {
            return Err(Error::RelationIdOutOfRange {
                id: relation.0,
                len: self.num_relations(),
            });
        }
        Ok(())
    }
}
