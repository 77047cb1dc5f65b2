//! Single-hop link prediction.
//!
//! A link query leaves exactly one slot of a triple open (or none, to score
//! the triple itself):
//!
//! | Query | Scores | Over |
//! |-------|--------|------|
//! | `(?, r, t)` | [`LinkQuery::MissingHead`] | entities |
//! | `(h, ?, t)` | [`LinkQuery::MissingRelation`] | relations |
//! | `(h, r, ?)` | [`LinkQuery::MissingTail`] | entities |
//! | `(h, r, t)` | [`LinkQuery::Triple`] | one score |
//!
//! The variant is chosen once, when the query is built (see
//! [`LinkQuery::from_names`]).

use crate::constraints::SemanticConstraints;
use crate::error::{Error, Result};
use crate::index::{EntityId, KgIndex, RelationId};
use crate::oracle::ScoreOracle;
use crate::scores::{sigmoid, Logits, Prediction, ScoreVector};
use ndarray::Array1;
use std::collections::{BTreeMap, BTreeSet};

/// A single-hop link prediction query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkQuery {
    /// `(?, relation, tail)`
    MissingHead { relation: RelationId, tail: EntityId },
    /// `(head, ?, tail)`
    MissingRelation { head: EntityId, tail: EntityId },
    /// `(head, relation, ?)`
    MissingTail { head: EntityId, relation: RelationId },
    /// `(head, relation, tail)`
    Triple {
        head: EntityId,
        relation: RelationId,
        tail: EntityId,
    },
}

impl LinkQuery {
    /// Build a query from optional names; `None` marks the open slot.
    ///
    /// At most one slot may be open.
    pub fn from_names(
        index: &KgIndex,
        head: Option<&str>,
        relation: Option<&str>,
        tail: Option<&str>,
    ) -> Result<Self> {
        let head = head.map(|h| index.entity_id(h)).transpose()?;
        let relation = relation.map(|r| index.relation_id(r)).transpose()?;
        let tail = tail.map(|t| index.entity_id(t)).transpose()?;
        match (head, relation, tail) {
            (None, Some(relation), Some(tail)) => Ok(Self::MissingHead { relation, tail }),
            (Some(head), None, Some(tail)) => Ok(Self::MissingRelation { head, tail }),
            (Some(head), Some(relation), None) => Ok(Self::MissingTail { head, relation }),
            (Some(head), Some(relation), Some(tail)) => Ok(Self::Triple {
                head,
                relation,
                tail,
            }),
            _ => Err(Error::Validation(
                "link query needs at least two of head, relation, tail".into(),
            )),
        }
    }

    /// Whether the open slot ranges over relations rather than entities.
    pub fn predicts_relation(&self) -> bool {
        matches!(self, Self::MissingRelation { .. })
    }
}

/// Result of a conjunctive chain query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConjunctiveAnswer {
    /// Entities reached after the last hop.
    pub answers: BTreeSet<EntityId>,
    /// Top-k tails of every expanded `(hop, head, relation)`.
    pub intermediate: BTreeMap<(usize, EntityId, RelationId), Vec<EntityId>>,
}

/// Link prediction front-end over a [`ScoreOracle`] and its [`KgIndex`].
pub struct Predictor<'a, O: ScoreOracle + ?Sized> {
    oracle: &'a O,
    index: &'a KgIndex,
    constraints: Option<SemanticConstraints>,
}

impl<'a, O: ScoreOracle + ?Sized> Predictor<'a, O> {
    pub fn new(oracle: &'a O, index: &'a KgIndex) -> Result<Self> {
        if oracle.num_entities() != index.num_entities()
            || oracle.num_relations() != index.num_relations()
        {
            return Err(Error::Validation(format!(
                "oracle covers {} entities / {} relations, index has {} / {}",
                oracle.num_entities(),
                oracle.num_relations(),
                index.num_entities(),
                index.num_relations()
            )));
        }
        Ok(Self {
            oracle,
            index,
            constraints: None,
        })
    }

    /// Mask head and tail candidates that violate `constraints`.
    pub fn with_constraints(mut self, constraints: SemanticConstraints) -> Result<Self> {
        if constraints.num_entities() != self.index.num_entities()
            || constraints.num_relations() != self.index.num_relations()
        {
            return Err(Error::Validation(format!(
                "constraints cover {} entities / {} relations, index has {} / {}",
                constraints.num_entities(),
                constraints.num_relations(),
                self.index.num_entities(),
                self.index.num_relations()
            )));
        }
        self.constraints = Some(constraints);
        Ok(self)
    }

    pub fn constraints(&self) -> Option<&SemanticConstraints> {
        self.constraints.as_ref()
    }

    pub fn index(&self) -> &KgIndex {
        self.index
    }

    /// Raw logits for the open slot (a single logit for [`LinkQuery::Triple`]).
    ///
    /// With constraints attached, masked candidates come back as `-inf`.
    pub fn predict_raw(&self, query: &LinkQuery) -> Result<Logits> {
        let mut logits = match *query {
            LinkQuery::MissingHead { relation, tail } => {
                self.oracle.predict_heads(relation, tail)?
            }
            LinkQuery::MissingRelation { head, tail } => {
                self.oracle.predict_relations(head, tail)?
            }
            LinkQuery::MissingTail { head, relation } => {
                self.oracle.predict_tails(head, relation)?
            }
            LinkQuery::Triple {
                head,
                relation,
                tail,
            } => {
                let score = self.oracle.score_triple(head, relation, tail)?;
                return Ok(Logits::new(Array1::from(vec![score])));
            }
        };
        if let Some(constraints) = &self.constraints {
            constraints.mask(query, &mut logits.0)?;
        }
        Ok(logits)
    }

    /// Calibrated scores for the open slot.
    pub fn predict(&self, query: &LinkQuery) -> Result<ScoreVector> {
        self.predict_raw(query)?.calibrate()
    }

    /// Top-k candidates for the open slot, best first.
    pub fn predict_topk(&self, query: &LinkQuery, k: usize) -> Result<Vec<Prediction>> {
        if let LinkQuery::Triple { .. } = query {
            return Err(Error::Validation(
                "top-k needs an open slot; use triple_score for a full triple".into(),
            ));
        }
        let scores = self.predict(query)?;
        scores
            .top_k(k)
            .into_iter()
            .map(|(id, score)| -> Result<Prediction> {
                let name = if query.predicts_relation() {
                    self.index.relation_name(RelationId(id.0))?
                } else {
                    self.index.entity_name(id)?
                };
                Ok(Prediction {
                    name: name.to_string(),
                    id: id.0,
                    score,
                })
            })
            .collect()
    }

    /// Score of one triple, calibrated unless `logits` is set.
    pub fn triple_score(
        &self,
        head: EntityId,
        relation: RelationId,
        tail: EntityId,
        logits: bool,
    ) -> Result<f32> {
        let raw = self.oracle.score_triple(head, relation, tail)?;
        if logits {
            Ok(raw)
        } else {
            Ok(sigmoid(raw))
        }
    }

    /// Answer set of a relation chain starting at `anchor`.
    ///
    /// ```text
    ///                                  -> result_1
    ///               -> e_i, rels[1]    -> result_2
    /// anchor, rels[0]
    ///               -> e_j, rels[1]    -> result_3
    ///                                  -> result_4
    /// ```
    ///
    /// Each hop keeps the top-k tails of every entity reached so far and
    /// unions them; scores are discarded.
    pub fn conjunctive_query(
        &self,
        anchor: EntityId,
        relations: &[RelationId],
        topk: usize,
    ) -> Result<ConjunctiveAnswer> {
        if relations.is_empty() {
            return Err(Error::Validation("conjunctive query needs at least one relation".into()));
        }
        let mut answer = ConjunctiveAnswer::default();
        let mut frontier = BTreeSet::from([anchor]);
        for (hop, &relation) in relations.iter().enumerate() {
            let mut next = BTreeSet::new();
            for &head in &frontier {
                let tails: Vec<EntityId> = self
                    .predict(&LinkQuery::MissingTail { head, relation })?
                    .top_k(topk)
                    .into_iter()
                    .map(|(e, _)| e)
                    .collect();
                next.extend(tails.iter().copied());
                answer.intermediate.insert((hop, head, relation), tails);
            }
            tracing::trace!(hop, relation = relation.0, reached = next.len(), "conjunctive hop");
            frontier = next;
        }
        answer.answers = frontier;
        Ok(answer)
    }

    /// [`conjunctive_query`](Self::conjunctive_query) with names.
    pub fn conjunctive_query_by_name(
        &self,
        anchor: &str,
        relations: &[&str],
        topk: usize,
    ) -> Result<BTreeSet<String>> {
        let anchor = self.index.entity_id(anchor)?;
        let relations = relations
            .iter()
            .map(|r| self.index.relation_id(r))
            .collect::<Result<Vec<_>>>()?;
        let answer = self.conjunctive_query(anchor, &relations, topk)?;
        answer
            .answers
            .into_iter()
            .map(|e| self.index.entity_name(e).map(str::to_string))
            .collect()
    }
}
