//! Dense entity and relation indices.
//!
//! Ids are assigned contiguously in insertion order and never change for the
//! lifetime of an index, so a [`ScoreVector`](crate::ScoreVector) position `i`
//! always refers to `EntityId(i)`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dense identifier of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub usize);

impl EntityId {
    /// Position of this entity in a score vector.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Dense identifier of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub usize);

impl RelationId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A triple of dense ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdTriple {
    pub head: EntityId,
    pub relation: RelationId,
    pub tail: EntityId,
}

impl IdTriple {
    pub fn new(head: EntityId, relation: RelationId, tail: EntityId) -> Self {
        Self { head, relation, tail }
    }
}

/// Bidirectional mapping between names and dense positions.
///
/// Serializes as the plain list of names (position = id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, returning its position. Known names keep their position.
    pub fn insert(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&pos) = self.positions.get(&name) {
            return pos;
        }
        let pos = self.names.len();
        self.positions.insert(name.clone(), pos);
        self.names.push(name);
        pos
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn name(&self, pos: usize) -> Option<&str> {
        self.names.get(pos).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        let mut vocab = Vocabulary::new();
        for name in names {
            if vocab.position(&name).is_some() {
                return Err(Error::Validation(format!("duplicate name in vocabulary: {name}")));
            }
            vocab.insert(name);
        }
        Ok(vocab)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.names
    }
}

/// Static entity and relation index of a trained model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KgIndex {
    entities: Vocabulary,
    relations: Vocabulary,
}

impl KgIndex {
    pub fn new(entities: Vocabulary, relations: Vocabulary) -> Self {
        Self { entities, relations }
    }

    /// Build an index from entity and relation names, in id order.
    pub fn from_names<E, R>(entities: E, relations: R) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let entities =
            Vocabulary::try_from(entities.into_iter().map(Into::into).collect::<Vec<_>>())?;
        let relations =
            Vocabulary::try_from(relations.into_iter().map(Into::into).collect::<Vec<_>>())?;
        Ok(Self { entities, relations })
    }

    /// Build an index from named triples, assigning ids in first-seen order.
    pub fn from_triples<'a>(
        triples: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Self {
        let mut index = Self::default();
        for (head, relation, tail) in triples {
            index.entities.insert(head);
            index.relations.insert(relation);
            index.entities.insert(tail);
        }
        index
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }

    pub fn entity_id(&self, name: &str) -> Result<EntityId> {
        self.entities
            .position(name)
            .map(EntityId)
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))
    }

    pub fn relation_id(&self, name: &str) -> Result<RelationId> {
        self.relations
            .position(name)
            .map(RelationId)
            .ok_or_else(|| Error::RelationNotFound(name.to_string()))
    }

    pub fn entity_name(&self, id: EntityId) -> Result<&str> {
        self.entities.name(id.0).ok_or(Error::EntityIdOutOfRange {
            id: id.0,
            len: self.entities.len(),
        })
    }

    pub fn relation_name(&self, id: RelationId) -> Result<&str> {
        self.relations.name(id.0).ok_or(Error::RelationIdOutOfRange {
            id: id.0,
            len: self.relations.len(),
        })
    }

    /// Resolve a named triple to ids.
    pub fn triple_id(&self, head: &str, relation: &str, tail: &str) -> Result<IdTriple> {
        Ok(IdTriple::new(
            self.entity_id(head)?,
            self.relation_id(relation)?,
            self.entity_id(tail)?,
        ))
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &str)> {
        self.entities.names().enumerate().map(|(i, n)| (EntityId(i), n))
    }

    pub fn relations(&self) -> impl Iterator<Item = (RelationId, &str)> {
        self.relations.names().enumerate().map(|(i, n)| (RelationId(i), n))
    }
}
