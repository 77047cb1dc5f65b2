//! Top-k beams and beam projection.
//!
//! Projecting a fuzzy set `q` through relation `r` asks for
//! `max_h T(q(h), p(h, r, t))` for every tail `t`. Over all entities that is one
//! model call per entity; a beam keeps only the `k` best heads:
//!
//! ```text
//! scores ──top-k──► [(h1, s1), ..., (hk, sk)]
//!                        │ one prediction per head
//!                        ▼
//!              rows (k × N), row i = T(si, p(hi, r, ·))
//!                        │ max over rows
//!                        ▼
//!                   ScoreVector (N)
//! ```
//!
//! The max is the single-best-witness reading of the existential over the
//! intermediate variable. Cost is `O(k · N)` per hop instead of `O(N²)`.

use crate::norms::TNorm;
use crate::oracle::Scorer;
use crate::Result;
use cqa_kge::{EntityId, RelationId, ScoreOracle, ScoreVector};
use ndarray::{Array1, Axis, Zip};

/// Up to `k` distinct entities with their scores, best first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Beam {
    entries: Vec<(EntityId, f32)>,
}

impl Beam {
    /// The `k` best entries of `scores`; ties go to the lower id.
    pub fn top_k(scores: &ScoreVector, k: usize) -> Self {
        Self {
            entries: scores.top_k(k),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entities(&self) -> Vec<EntityId> {
        self.entries.iter().map(|&(e, _)| e).collect()
    }

    /// Carried scores, in beam order.
    pub fn scores(&self) -> Array1<f32> {
        self.entries.iter().map(|&(_, s)| s).collect()
    }

    /// Expand every beam entity through `relation` and keep the best witness
    /// per tail. An empty beam projects to all zeros.
    pub fn project<O: ScoreOracle + ?Sized>(
        &self,
        scorer: &Scorer<'_, O>,
        relation: RelationId,
        tnorm: TNorm,
    ) -> Result<ScoreVector> {
        if self.is_empty() {
            return Ok(ScoreVector::zeros(scorer.num_entities()));
        }
        let mut rows = scorer.score_rows(&self.entities(), relation)?;
        let carried = self.scores().insert_axis(Axis(1));
        Zip::from(&mut rows)
            .and_broadcast(&carried)
            .for_each(|row, &carry| *row = tnorm.conjoin(carry, *row));
        let best = rows.fold_axis(Axis(0), 0.0_f32, |acc: &f32, x: &f32| acc.max(*x));
        Ok(ScoreVector::from_probabilities(best)?)
    }
}
