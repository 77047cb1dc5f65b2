//! Rank-based link prediction evaluation.
//!
//! Every test triple `(h, r, t)` contributes two ranks:
//! 1. **Tail rank**: position of `t` among all `(h, r, ?)` candidates
//! 2. **Head rank**: position of `h` among all `(?, r, t)` candidates
//!
//! # Filtered vs Raw
//!
//! | Setting | Negatives | Use Case |
//! |---------|-----------|----------|
//! | Raw | Every other entity | Pessimistic estimate |
//! | Filtered | Every other entity not forming a known triple | Standard benchmark |
//!
//! Ranks count only candidates scoring strictly higher than the true entity,
//! so ties resolve in the true entity's favour.
//!
//! # Metrics
//!
//! | Metric | Range | Description |
//! |--------|-------|-------------|
//! | MRR | (0, 1] | Mean of 1/rank |
//! | MR | [1, N] | Mean rank |
//! | Hits@k | [0, 1] | Fraction with rank <= k, for k in {1, 3, 10} |

use crate::error::{Error, Result};
use crate::index::{EntityId, IdTriple, KgIndex};
use crate::oracle::ScoreOracle;
use serde::Serialize;
use std::collections::HashSet;

/// Aggregated rank metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankMetrics {
    /// Mean Reciprocal Rank: E\[1/rank\]
    pub mrr: f64,
    /// Mean Rank: E\[rank\]
    pub mr: f64,
    pub hits_at_1: f64,
    pub hits_at_3: f64,
    pub hits_at_10: f64,
    /// Number of ranks aggregated (two per test triple).
    pub num_triples: usize,
}

impl RankMetrics {
    pub fn from_ranks(ranks: &[usize]) -> Self {
        if ranks.is_empty() {
            return Self::default();
        }
        let n = ranks.len() as f64;
        let hits = |k: usize| ranks.iter().filter(|&&r| r <= k).count() as f64 / n;
        Self {
            mrr: ranks.iter().map(|&r| 1.0 / r as f64).sum::<f64>() / n,
            mr: ranks.iter().map(|&r| r as f64).sum::<f64>() / n,
            hits_at_1: hits(1),
            hits_at_3: hits(3),
            hits_at_10: hits(10),
            num_triples: ranks.len(),
        }
    }

    /// Weighted average of several runs.
    pub fn merge(metrics: &[Self]) -> Self {
        let total: usize = metrics.iter().map(|m| m.num_triples).sum();
        if total == 0 {
            return Self::default();
        }
        let total_f = total as f64;
        let weighted = |f: fn(&Self) -> f64| {
            metrics
                .iter()
                .map(|m| f(m) * m.num_triples as f64)
                .sum::<f64>()
                / total_f
        };
        Self {
            mrr: weighted(|m| m.mrr),
            mr: weighted(|m| m.mr),
            hits_at_1: weighted(|m| m.hits_at_1),
            hits_at_3: weighted(|m| m.hits_at_3),
            hits_at_10: weighted(|m| m.hits_at_10),
            num_triples: total,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "MRR: {:.4} | MR: {:.1} | H@1: {:.3} | H@3: {:.3} | H@10: {:.3} (n={})",
            self.mrr, self.mr, self.hits_at_1, self.hits_at_3, self.hits_at_10, self.num_triples
        )
    }
}

/// 1 + the number of scores strictly greater than `target`.
pub fn compute_rank(target: f32, scores: &[f32]) -> usize {
    1 + scores.iter().filter(|&&s| s > target).count()
}

/// Link prediction evaluator over a [`ScoreOracle`].
///
/// Known triples (train + valid + test) are only consulted in filtered mode.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    known_triples: HashSet<IdTriple>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_known_triple(&mut self, triple: IdTriple) {
        self.known_triples.insert(triple);
    }

    pub fn add_known_triples(&mut self, triples: impl IntoIterator<Item = IdTriple>) {
        self.known_triples.extend(triples);
    }

    pub fn is_known(&self, triple: &IdTriple) -> bool {
        self.known_triples.contains(triple)
    }

    /// Rank of the true tail among `(head, relation, ?)`.
    pub fn rank_tail<O: ScoreOracle + ?Sized>(
        &self,
        oracle: &O,
        triple: &IdTriple,
        filtered: bool,
    ) -> Result<usize> {
        oracle.check_entity(triple.head)?;
        oracle.check_entity(triple.tail)?;
        oracle.check_relation(triple.relation)?;
        let logits = oracle.predict_tails(triple.head, triple.relation)?;
        let scores = logits.as_array();
        let target = scores[triple.tail.index()];
        let rank = 1 + scores
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != triple.tail.index())
            .filter(|&(i, _)| {
                let candidate = IdTriple::new(triple.head, triple.relation, EntityId(i));
                !filtered || !self.is_known(&candidate)
            })
            .filter(|&(_, &s)| s > target)
            .count();
        Ok(rank)
    }

    /// Rank of the true head among `(?, relation, tail)`.
    pub fn rank_head<O: ScoreOracle + ?Sized>(
        &self,
        oracle: &O,
        triple: &IdTriple,
        filtered: bool,
    ) -> Result<usize> {
        oracle.check_entity(triple.head)?;
        oracle.check_entity(triple.tail)?;
        oracle.check_relation(triple.relation)?;
        let logits = oracle.predict_heads(triple.relation, triple.tail)?;
        let scores = logits.as_array();
        let target = scores[triple.head.index()];
        let rank = 1 + scores
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != triple.head.index())
            .filter(|&(i, _)| {
                let candidate = IdTriple::new(EntityId(i), triple.relation, triple.tail);
                !filtered || !self.is_known(&candidate)
            })
            .filter(|&(_, &s)| s > target)
            .count();
        Ok(rank)
    }

    /// Head and tail ranks of every test triple, aggregated.
    ///
    /// An empty test set is an error.
    pub fn evaluate<O: ScoreOracle + ?Sized>(
        &self,
        oracle: &O,
        test_triples: &[IdTriple],
        filtered: bool,
    ) -> Result<RankMetrics> {
        if test_triples.is_empty() {
            return Err(Error::Validation("link prediction needs at least one test triple".into()));
        }
        let mut ranks = Vec::with_capacity(2 * test_triples.len());
        for triple in test_triples {
            ranks.push(self.rank_tail(oracle, triple, filtered)?);
            ranks.push(self.rank_head(oracle, triple, filtered)?);
        }
        let metrics = RankMetrics::from_ranks(&ranks);
        tracing::info!(filtered, summary = %metrics.summary(), "link prediction evaluated");
        Ok(metrics)
    }

    /// [`evaluate`](Self::evaluate) over named triples.
    pub fn evaluate_named<O: ScoreOracle + ?Sized>(
        &self,
        oracle: &O,
        index: &KgIndex,
        test_triples: &[(&str, &str, &str)],
        filtered: bool,
    ) -> Result<RankMetrics> {
        let ids = test_triples
            .iter()
            .map(|&(h, r, t)| index.triple_id(h, r, t))
            .collect::<Result<Vec<_>>>()?;
        self.evaluate(oracle, &ids, filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RelationId;
    use crate::table::ScoreTable;
    use approx::assert_relative_eq;

    fn triple(h: usize, t: usize) -> IdTriple {
        IdTriple::new(EntityId(h), RelationId(0), EntityId(t))
    }

    // 0 -r-> {1: 0.6, 2: 0.9, 3: 0.2}
    fn table() -> ScoreTable {
        let mut table = ScoreTable::new(4, 1);
        table
            .set_probabilities(EntityId(0), RelationId(0), &[0.1, 0.6, 0.9, 0.2])
            .unwrap();
        table
    }

    #[test]
    fn test_metrics_from_ranks() {
        let m = RankMetrics::from_ranks(&[1, 2, 4, 20]);
        assert_relative_eq!(m.mrr, (1.0 + 0.5 + 0.25 + 0.05) / 4.0, epsilon = 1e-12);
        assert_relative_eq!(m.mr, 6.75, epsilon = 1e-12);
        assert_relative_eq!(m.hits_at_1, 0.25, epsilon = 1e-12);
        assert_relative_eq!(m.hits_at_3, 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.hits_at_10, 0.75, epsilon = 1e-12);
        assert_eq!(RankMetrics::from_ranks(&[]), RankMetrics::default());
    }

    #[test]
    fn test_merge_weights_by_count() {
        let a = RankMetrics::from_ranks(&[1]);
        let b = RankMetrics::from_ranks(&[2, 2, 2]);
        let merged = RankMetrics::merge(&[a, b]);
        assert_eq!(merged.num_triples, 4);
        assert_relative_eq!(merged.mrr, (1.0 + 1.5) / 4.0, epsilon = 1e-12);
        assert_relative_eq!(merged.hits_at_1, 0.25, epsilon = 1e-12);
        assert!(merged.summary().starts_with("MRR: 0.6250"));
    }

    #[test]
    fn test_compute_rank_counts_strictly_greater() {
        assert_eq!(compute_rank(0.5, &[0.9, 0.5, 0.1, 0.7]), 3);
        assert_eq!(compute_rank(1.0, &[0.9, 1.0]), 1);
    }

    #[test]
    fn test_raw_vs_filtered_tail_rank() {
        let table = table();
        let mut eval = Evaluator::new();
        // 2 outscores 1, but (0, r, 2) is a known fact.
        eval.add_known_triples([triple(0, 1), triple(0, 2)]);
        let test = triple(0, 1);
        assert_eq!(eval.rank_tail(&table, &test, false).unwrap(), 2);
        assert_eq!(eval.rank_tail(&table, &test, true).unwrap(), 1);
        assert!(eval.is_known(&triple(0, 2)));
    }

    #[test]
    fn test_head_rank_uses_head_filter() {
        let mut table = table();
        table
            .set_probabilities(EntityId(3), RelationId(0), &[0.1, 0.8, 0.1, 0.1])
            .unwrap();
        let mut eval = Evaluator::new();
        // (?, r, 1): head 3 at 0.8 beats head 0 at 0.6.
        let test = triple(0, 1);
        assert_eq!(eval.rank_head(&table, &test, true).unwrap(), 2);
        eval.add_known_triple(triple(3, 1));
        assert_eq!(eval.rank_head(&table, &test, true).unwrap(), 1);
        assert_eq!(eval.rank_head(&table, &test, false).unwrap(), 2);
    }

    #[test]
    fn test_evaluate_rejects_empty_and_unknown() {
        let table = table();
        let eval = Evaluator::new();
        assert!(matches!(
            eval.evaluate(&table, &[], true),
            Err(Error::Validation(_))
        ));
        let bad = IdTriple::new(EntityId(0), RelationId(0), EntityId(9));
        assert!(eval.evaluate(&table, &[bad], false).unwrap_err().is_lookup());
    }

    #[test]
    fn test_evaluate_pairs_head_and_tail_ranks() {
        let table = table();
        let metrics = Evaluator::new().evaluate(&table, &[triple(0, 2)], false).unwrap();
        // Tail 2 is the top tail; head 0 is the only head with a strong score.
        assert_eq!(metrics.num_triples, 2);
        assert_relative_eq!(metrics.hits_at_1, 1.0, epsilon = 1e-12);
    }
}
