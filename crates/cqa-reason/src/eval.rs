//! Beam-search evaluation of logical queries.
//!
//! A tree walk over [`LogicalQuery`]; every node evaluates to a calibrated
//! [`ScoreVector`] over all entities.
//!
//! | Node | Result |
//! |------|--------|
//! | `Entity(e)` | one-hot at `e` |
//! | `Projection(Entity(e), r)` | one prediction `p(e, r, ·)` |
//! | `Projection(q, r)` | top-k beam of `q`, projected through `r` ([`Beam::project`]) |
//! | `Intersection(qs)` | t-norm fold |
//! | `Union(qs)` | t-conorm fold |
//! | `Negation(q)` | negation norm |

use crate::beam::Beam;
use crate::bind::bind;
use crate::config::AlgebraConfig;
use crate::grammar::QueryType;
use crate::norms::{negation_norm, t_conorm, t_norm};
use crate::oracle::Scorer;
use crate::query::{LogicalQuery, QueryTerm};
use crate::rank::{rank, Answer};
use crate::{QueryAnswer, ReasonError, Reasoner, Result};
use cqa_kge::{EntityId, KgIndex, ScoreOracle, ScoreVector};
use ndarray::Array1;

/// Answers logical queries with a KGE oracle, fuzzy connectives and top-k beams.
pub struct BeamSearchReasoner<'a, O: ScoreOracle + ?Sized> {
    scorer: Scorer<'a, O>,
    index: &'a KgIndex,
    config: AlgebraConfig,
}

impl<'a, O: ScoreOracle + ?Sized> BeamSearchReasoner<'a, O> {
    /// Fails if `config` is invalid for this graph or the oracle and index
    /// disagree on the vocabulary sizes.
    pub fn new(oracle: &'a O, index: &'a KgIndex, config: AlgebraConfig) -> Result<Self> {
        config.validate(index.num_entities())?;
        if oracle.num_entities() != index.num_entities()
            || oracle.num_relations() != index.num_relations()
        {
            return Err(cqa_kge::Error::Validation(format!(
                "oracle scores {} entities / {} relations, index has {} / {}",
                oracle.num_entities(),
                oracle.num_relations(),
                index.num_entities(),
                index.num_relations()
            ))
            .into());
        }
        Ok(Self {
            scorer: Scorer::new(oracle),
            index,
            config,
        })
    }

    pub fn config(&self) -> &AlgebraConfig {
        &self.config
    }

    pub fn index(&self) -> &KgIndex {
        self.index
    }

    /// Single-hop predictions issued by this reasoner so far.
    pub fn oracle_calls(&self) -> usize {
        self.scorer.oracle_calls()
    }

    /// Per-entity scores of `query`.
    pub fn evaluate(&self, query: &LogicalQuery) -> Result<ScoreVector> {
        match query {
            LogicalQuery::Entity(entity) => {
                Ok(ScoreVector::one_hot(self.index.num_entities(), *entity)?)
            }
            LogicalQuery::Projection(inner, relation) => match inner.as_ref() {
                LogicalQuery::Entity(head) => self.scorer.score(*head, *relation),
                compound => {
                    let scores = self.evaluate(compound)?;
                    let beam = Beam::top_k(&scores, self.config.k);
                    tracing::trace!(
                        width = beam.len(),
                        relation = relation.0,
                        "projecting beam"
                    );
                    beam.project(&self.scorer, *relation, self.config.tnorm)
                }
            },
            LogicalQuery::Intersection(operands) => {
                let tnorm = self.config.tnorm;
                self.fold(operands, "intersection", |a, b| t_norm(a, b, tnorm))
            }
            LogicalQuery::Union(operands) => {
                let tnorm = self.config.tnorm;
                self.fold(operands, "union", |a, b| t_conorm(a, b, tnorm))
            }
            LogicalQuery::Negation(inner) => {
                let scores = self.evaluate(inner)?;
                let negated =
                    negation_norm(scores.as_array(), self.config.neg_norm, self.config.lambda);
                Ok(ScoreVector::from_probabilities(negated)?)
            }
        }
    }

    fn fold(
        &self,
        operands: &[LogicalQuery],
        op: &str,
        combine: impl Fn(&Array1<f32>, &Array1<f32>) -> Array1<f32>,
    ) -> Result<ScoreVector> {
        let (first, rest) = operands
            .split_first()
            .ok_or_else(|| ReasonError::MalformedQuery(format!("{op} without operands")))?;
        let mut acc = self.evaluate(first)?.into_inner();
        for operand in rest {
            let next = self.evaluate(operand)?;
            acc = combine(&acc, next.as_array());
        }
        Ok(ScoreVector::from_probabilities(acc)?)
    }

    /// Answer a query given as a type tag and name payload.
    ///
    /// Returns ranked answers, or the raw score vector when `only_scores` is set.
    pub fn answer(&self, query_type: &str, payload: &QueryTerm) -> Result<QueryAnswer> {
        let query_type: QueryType = query_type.parse()?;
        let query = bind(query_type, payload, self.index)?;
        tracing::debug!(
            query_type = query_type.as_str(),
            hops = query.num_projections(),
            k = self.config.k,
            tnorm = self.config.tnorm.as_str(),
            neg_norm = self.config.neg_norm.as_str(),
            "answering query"
        );
        let before = self.oracle_calls();
        let scores = self.evaluate(&query)?;
        tracing::debug!(
            query_type = query_type.as_str(),
            oracle_calls = self.oracle_calls() - before,
            "query evaluated"
        );
        if self.config.only_scores {
            return Ok(QueryAnswer::Scores(scores));
        }
        Ok(QueryAnswer::Ranked(rank(&scores, self.index)?))
    }
}

impl<O: ScoreOracle + ?Sized> Reasoner for BeamSearchReasoner<'_, O> {
    fn score(&self, query: &LogicalQuery, entity: EntityId) -> Result<f32> {
        let scores = self.evaluate(query)?;
        scores.get(entity).ok_or_else(|| {
            cqa_kge::Error::EntityIdOutOfRange {
                id: entity.0,
                len: scores.len(),
            }
            .into()
        })
    }

    fn predict(&self, query: &LogicalQuery, k: usize) -> Result<Vec<Answer>> {
        let mut answers = rank(&self.evaluate(query)?, self.index)?;
        answers.truncate(k);
        Ok(answers)
    }
}
