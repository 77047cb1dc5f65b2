//! Payload binding: check a [`QueryTerm`] against the structure of its query
//! type, resolve names to ids, and lower it into a [`LogicalQuery`].
//!
//! Lowering is driven by the structure alone, so every query type goes through
//! the same three rules:
//!
//! - `(x, (r, ..., [n]))`: project `x` through each relation, then negate if the
//!   chain ends in `n`.
//! - `(x, y, ..., (u,))`: union of the siblings.
//! - `(x, y, ...)`: intersection of the siblings.

use crate::grammar::{QueryType, Shape, Symbol};
use crate::query::{LogicalQuery, QueryTerm};
use crate::{ReasonError, Result};
use cqa_kge::KgIndex;

/// Bind `payload` to the structure of `query_type`.
///
/// Arity and marker mismatches fail with [`ReasonError::MalformedQuery`]
/// before any name is looked up; unknown names then fail as lookup errors.
pub fn bind(query_type: QueryType, payload: &QueryTerm, index: &KgIndex) -> Result<LogicalQuery> {
    let shape = query_type.structure();
    conform(&shape, payload, &mut String::from("query"))
        .map_err(|detail| ReasonError::MalformedQuery(format!("{query_type}: {detail}")))?;
    lower(&shape, payload, index)
}

fn conform(shape: &Shape, term: &QueryTerm, path: &mut String) -> std::result::Result<(), String> {
    match (shape, term) {
        (Shape::Symbol(Symbol::Entity | Symbol::Relation), QueryTerm::Name(_)) => Ok(()),
        (Shape::Symbol(Symbol::Negation), QueryTerm::Name(n)) if n == "n" => Ok(()),
        (Shape::Symbol(Symbol::Union), QueryTerm::Name(u)) if u == "u" => Ok(()),
        (Shape::Symbol(symbol), found) => Err(format!(
            "expected {} at {path}, found {found:?}",
            describe(*symbol)
        )),
        (Shape::Tuple(items), QueryTerm::Tuple(terms)) => {
            if items.len() != terms.len() {
                return Err(format!(
                    "expected {} items at {path}, found {}",
                    items.len(),
                    terms.len()
                ));
            }
            for (i, (item, term)) in items.iter().zip(terms).enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                conform(item, term, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        (Shape::Tuple(items), QueryTerm::Name(name)) => Err(format!(
            "expected a tuple of {} items at {path}, found name '{name}'",
            items.len()
        )),
    }
}

fn describe(symbol: Symbol) -> &'static str {
    match symbol {
        Symbol::Entity => "an entity name",
        Symbol::Relation => "a relation name",
        Symbol::Negation => "the negation marker \"n\"",
        Symbol::Union => "the union marker \"u\"",
    }
}

fn lower(shape: &Shape, term: &QueryTerm, index: &KgIndex) -> Result<LogicalQuery> {
    match (shape, term) {
        (Shape::Symbol(Symbol::Entity), QueryTerm::Name(name)) => {
            Ok(LogicalQuery::Entity(index.entity_id(name)?))
        }
        (Shape::Tuple(items), QueryTerm::Tuple(terms)) => {
            let (Some(last), Some(last_term)) = (items.last(), terms.last()) else {
                return Err(ReasonError::MalformedQuery("empty tuple".into()));
            };
            let (base, base_terms) = (&items[..items.len() - 1], &terms[..terms.len() - 1]);
            match last.items().first().and_then(Shape::as_symbol) {
                Some(Symbol::Relation) => {
                    let subject = match (base, base_terms) {
                        ([single], [single_term]) => lower(single, single_term, index)?,
                        _ => LogicalQuery::Intersection(lower_all(base, base_terms, index)?),
                    };
                    apply_chain(subject, last, last_term, index)
                }
                Some(Symbol::Union) => Ok(LogicalQuery::Union(lower_all(base, base_terms, index)?)),
                _ => Ok(LogicalQuery::Intersection(lower_all(items, terms, index)?)),
            }
        }
        _ => Err(ReasonError::MalformedQuery(format!(
            "cannot bind {term:?} to {shape}"
        ))),
    }
}

fn lower_all(shapes: &[Shape], terms: &[QueryTerm], index: &KgIndex) -> Result<Vec<LogicalQuery>> {
    shapes
        .iter()
        .zip(terms)
        .map(|(shape, term)| lower(shape, term, index))
        .collect()
}

fn apply_chain(
    mut query: LogicalQuery,
    chain: &Shape,
    chain_term: &QueryTerm,
    index: &KgIndex,
) -> Result<LogicalQuery> {
    let QueryTerm::Tuple(terms) = chain_term else {
        return Err(ReasonError::MalformedQuery(format!(
            "expected a relation chain, found {chain_term:?}"
        )));
    };
    for (symbol, term) in chain.items().iter().zip(terms) {
        query = match (symbol.as_symbol(), term) {
            (Some(Symbol::Relation), QueryTerm::Name(name)) => {
                query.project(index.relation_id(name)?)
            }
            (Some(Symbol::Negation), _) => query.not(),
            _ => {
                return Err(ReasonError::MalformedQuery(format!(
                    "unexpected {term:?} in relation chain {chain}"
                )))
            }
        };
    }
    Ok(query)
}
