//! Scoring adapter between the evaluator and a [`ScoreOracle`].
//!
//! The oracle speaks logits; the evaluator only ever sees calibrated
//! [`ScoreVector`]s. [`Scorer`] does the conversion, bounds-checks ids before
//! the model is touched, and counts model calls.

use crate::Result;
use cqa_kge::{check_probabilities, sigmoid, EntityId, Logits, RelationId, ScoreOracle, ScoreVector};
use ndarray::Array2;
use std::cell::Cell;

pub struct Scorer<'a, O: ScoreOracle + ?Sized> {
    oracle: &'a O,
    calls: Cell<usize>,
}

impl<'a, O: ScoreOracle + ?Sized> Scorer<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            calls: Cell::new(0),
        }
    }

    pub fn num_entities(&self) -> usize {
        self.oracle.num_entities()
    }

    /// Raw tail logits of `(head, relation, ?)`.
    pub fn raw(&self, head: EntityId, relation: RelationId) -> Result<Logits> {
        self.oracle.check_entity(head)?;
        self.oracle.check_relation(relation)?;
        self.calls.set(self.calls.get() + 1);
        tracing::trace!(head = head.0, relation = relation.0, "single-hop prediction");
        let logits = self.oracle.predict_tails(head, relation)?;
        if logits.len() != self.num_entities() {
            return Err(cqa_kge::Error::Validation(format!(
                "oracle returned {} scores for {} entities",
                logits.len(),
                self.num_entities()
            ))
            .into());
        }
        Ok(logits)
    }

    /// Calibrated tail scores of `(head, relation, ?)`.
    pub fn score(&self, head: EntityId, relation: RelationId) -> Result<ScoreVector> {
        Ok(self.raw(head, relation)?.calibrate()?)
    }

    /// Calibrated tail scores for several heads, one row per head.
    pub fn score_rows(&self, heads: &[EntityId], relation: RelationId) -> Result<Array2<f32>> {
        for &head in heads {
            self.oracle.check_entity(head)?;
        }
        self.oracle.check_relation(relation)?;
        self.calls.set(self.calls.get() + heads.len());
        tracing::trace!(heads = heads.len(), relation = relation.0, "batched prediction");
        let mut rows = self.oracle.predict_tails_batch(heads, relation)?;
        let expected = (heads.len(), self.num_entities());
        if rows.dim() != expected {
            return Err(cqa_kge::Error::Validation(format!(
                "oracle returned a {:?} batch, expected {:?}",
                rows.dim(),
                expected
            ))
            .into());
        }
        rows.mapv_inplace(sigmoid);
        check_probabilities(&mut rows)?;
        Ok(rows)
    }

    /// Single-hop predictions issued so far (one per head).
    pub fn oracle_calls(&self) -> usize {
        self.calls.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use approx::assert_relative_eq;
    use cqa_kge::ScoreTable;

    /// Batched backend that drops the last tail column.
    struct NarrowBatch(ScoreTable);

    impl ScoreOracle for NarrowBatch {
        fn num_entities(&self) -> usize {
            self.0.num_entities()
        }

        fn num_relations(&self) -> usize {
            self.0.num_relations()
        }

        fn predict_tails(&self, head: EntityId, relation: RelationId) -> cqa_kge::Result<Logits> {
            self.0.predict_tails(head, relation)
        }

        fn score_triple(
            &self,
            head: EntityId,
            relation: RelationId,
            tail: EntityId,
        ) -> cqa_kge::Result<f32> {
            self.0.score_triple(head, relation, tail)
        }

        fn predict_tails_batch(
            &self,
            heads: &[EntityId],
            _relation: RelationId,
        ) -> cqa_kge::Result<Array2<f32>> {
            Ok(Array2::zeros((heads.len(), self.num_entities() - 1)))
        }
    }

    fn table() -> ScoreTable {
        let mut table = ScoreTable::new(3, 1);
        table
            .set_probabilities(EntityId(0), RelationId(0), &[0.1, 0.9, 0.5])
            .unwrap();
        table
    }

    #[test]
    fn test_raw_and_calibrated_modes() {
        let table = table();
        let scorer = Scorer::new(&table);
        let raw = scorer.raw(EntityId(0), RelationId(0)).unwrap();
        assert!(raw.as_array()[0] < 0.0);
        let scores = scorer.score(EntityId(0), RelationId(0)).unwrap();
        assert_relative_eq!(scores.get(EntityId(1)).unwrap(), 0.9, epsilon = 1e-5);
        assert_eq!(scorer.oracle_calls(), 2);
    }

    #[test]
    fn test_rows_are_calibrated() {
        let table = table();
        let scorer = Scorer::new(&table);
        let rows = scorer
            .score_rows(&[EntityId(0), EntityId(1)], RelationId(0))
            .unwrap();
        assert_eq!(rows.dim(), (2, 3));
        assert_relative_eq!(rows[[0, 2]], 0.5, epsilon = 1e-5);
        assert!(rows.row(1).iter().all(|&s| s < 1e-3));
        assert_eq!(scorer.oracle_calls(), 2);
    }

    #[test]
    fn test_unknown_ids_fail_before_model_call() {
        let table = table();
        let scorer = Scorer::new(&table);
        let err = scorer.score(EntityId(7), RelationId(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        let err = scorer.score_rows(&[EntityId(0)], RelationId(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(scorer.oracle_calls(), 0);
    }

    #[test]
    fn test_misshapen_batch_is_rejected() {
        let oracle = NarrowBatch(table());
        let scorer = Scorer::new(&oracle);
        let err = scorer
            .score_rows(&[EntityId(0), EntityId(1)], RelationId(0))
            .unwrap_err();
        assert!(matches!(err, crate::ReasonError::Kg(cqa_kge::Error::Validation(_))));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
