use cqa_kge::{EntityId, RelationId};
use serde::{Deserialize, Serialize};

/// A query payload as supplied by a caller: names nested in tuples.
///
/// Mirrors the tuple layout of the query's [`Shape`](crate::Shape), with
/// entity and relation names in place of `e` and `r` and the literal markers
/// `"n"` and `"u"` in place of negation and union. In JSON a 2in payload
/// looks like:
///
/// ```json
/// [["A", ["knows"]], ["B", ["likes", "n"]]]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryTerm {
    Name(String),
    Tuple(Vec<QueryTerm>),
}

impl QueryTerm {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn tuple(items: impl IntoIterator<Item = QueryTerm>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// `(entity, (relations...))`.
    pub fn atom(entity: &str, relations: &[&str]) -> Self {
        Self::tuple([
            Self::name(entity),
            Self::tuple(relations.iter().map(|r| Self::name(*r))),
        ])
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(cqa_kge::Error::from)
            .map_err(Into::into)
    }
}

impl From<&str> for QueryTerm {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<Vec<QueryTerm>> for QueryTerm {
    fn from(items: Vec<QueryTerm>) -> Self {
        Self::Tuple(items)
    }
}

/// A multi-hop logical query over resolved ids.
///
/// These queries combine entities and relations using logical operators
/// like projection, intersection (AND), union (OR), and negation (NOT).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalQuery {
    /// Base case: an anchor entity.
    Entity(EntityId),
    /// Relation projection (q, r) -> {t | ∃h ∈ q: (h, r, t)}.
    Projection(Box<LogicalQuery>, RelationId),
    /// Intersection of multiple queries (AND).
    Intersection(Vec<LogicalQuery>),
    /// Union of multiple queries (OR).
    Union(Vec<LogicalQuery>),
    /// Negation of a query (NOT).
    Negation(Box<LogicalQuery>),
}

impl LogicalQuery {
    pub fn entity(id: EntityId) -> Self {
        Self::Entity(id)
    }

    pub fn project(self, relation: RelationId) -> Self {
        Self::Projection(Box::new(self), relation)
    }

    pub fn and(queries: Vec<LogicalQuery>) -> Self {
        Self::Intersection(queries)
    }

    pub fn or(queries: Vec<LogicalQuery>) -> Self {
        Self::Union(queries)
    }

    pub fn not(self) -> Self {
        Self::Negation(Box::new(self))
    }

    /// Number of relation hops, the upper bound on beam expansions.
    pub fn num_projections(&self) -> usize {
        match self {
            Self::Entity(_) => 0,
            Self::Projection(inner, _) => 1 + inner.num_projections(),
            Self::Intersection(qs) | Self::Union(qs) => qs.iter().map(Self::num_projections).sum(),
            Self::Negation(inner) => inner.num_projections(),
        }
    }
}
