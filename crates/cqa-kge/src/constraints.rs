//! Domain and range constraints learned from training triples.
//!
//! For a relation `r`, the domain is every head seen with `r` and the range
//! every tail seen with `r`. A constrained [`Predictor`](crate::Predictor)
//! masks head candidates outside the domain and tail candidates outside the
//! range to `-inf`, so they calibrate to 0 and rank last.

use crate::error::{Error, Result};
use crate::index::{EntityId, IdTriple, RelationId};
use crate::predict::LinkQuery;
use ndarray::Array1;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticConstraints {
    num_entities: usize,
    domain: Vec<BTreeSet<EntityId>>,
    range: Vec<BTreeSet<EntityId>>,
}

impl SemanticConstraints {
    /// Collect per-relation domains and ranges; every id must be in bounds.
    pub fn from_triples<'a>(
        num_entities: usize,
        num_relations: usize,
        triples: impl IntoIterator<Item = &'a IdTriple>,
    ) -> Result<Self> {
        let mut domain = vec![BTreeSet::new(); num_relations];
        let mut range = vec![BTreeSet::new(); num_relations];
        for triple in triples {
            for entity in [triple.head, triple.tail] {
                if entity.index() >= num_entities {
                    return Err(Error::EntityIdOutOfRange {
                        id: entity.0,
                        len: num_entities,
                    });
                }
            }
            let r = triple.relation.index();
            if r >= num_relations {
                return Err(Error::RelationIdOutOfRange {
                    id: r,
                    len: num_relations,
                });
            }
            domain[r].insert(triple.head);
            range[r].insert(triple.tail);
        }
        Ok(Self {
            num_entities,
            domain,
            range,
        })
    }

    pub fn num_entities(&self) -> usize {
        self.num_entities
    }

    pub fn num_relations(&self) -> usize {
        self.domain.len()
    }

    /// Heads observed with `relation`; `None` for unknown relations.
    pub fn domain(&self, relation: RelationId) -> Option<&BTreeSet<EntityId>> {
        self.domain.get(relation.index())
    }

    /// Tails observed with `relation`.
    pub fn range(&self, relation: RelationId) -> Option<&BTreeSet<EntityId>> {
        self.range.get(relation.index())
    }

    pub fn allows_head(&self, relation: RelationId, head: EntityId) -> bool {
        self.domain(relation).is_some_and(|d| d.contains(&head))
    }

    pub fn allows_tail(&self, relation: RelationId, tail: EntityId) -> bool {
        self.range(relation).is_some_and(|r| r.contains(&tail))
    }

    /// Set disallowed candidates of an entity-valued slot to `-inf`.
    ///
    /// Relation and full-triple queries are left untouched.
    pub fn mask(&self, query: &LinkQuery, logits: &mut Array1<f32>) -> Result<()> {
        let (allowed, relation) = match *query {
            LinkQuery::MissingHead { relation, .. } => (self.domain(relation), relation),
            LinkQuery::MissingTail { relation, .. } => (self.range(relation), relation),
            LinkQuery::MissingRelation { .. } | LinkQuery::Triple { .. } => return Ok(()),
        };
        let allowed = allowed.ok_or(Error::RelationIdOutOfRange {
            id: relation.0,
            len: self.num_relations(),
        })?;
        if logits.len() != self.num_entities {
            return Err(Error::Validation(format!(
                "cannot mask {} scores with constraints over {} entities",
                logits.len(),
                self.num_entities
            )));
        }
        for (i, logit) in logits.iter_mut().enumerate() {
            if !allowed.contains(&EntityId(i)) {
                *logit = f32::NEG_INFINITY;
            }
        }
        Ok(())
    }
}
