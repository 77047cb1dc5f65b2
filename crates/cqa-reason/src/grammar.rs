//! Query structures and their named types.
//!
//! Following the KGReasoning convention (Ren et al. 2020), a query shape is a
//! nested tuple over four symbols:
//!
//! - `e`: anchor entity
//! - `r`: relation hop
//! - `n`: negate the preceding hop chain
//! - `u`: disjoin the sibling branches
//!
//! Each supported shape has exactly one name:
//!
//! | Type | Structure |
//! |------|-----------|
//! | 1p | `(e, (r,))` |
//! | 2p | `(e, (r, r))` |
//! | 3p | `(e, (r, r, r))` |
//! | 2i | `((e, (r,)), (e, (r,)))` |
//! | 3i | `((e, (r,)), (e, (r,)), (e, (r,)))` |
//! | pi | `((e, (r, r)), (e, (r,)))` |
//! | ip | `(((e, (r,)), (e, (r,))), (r,))` |
//! | 2in | `((e, (r,)), (e, (r, n)))` |
//! | 3in | `((e, (r,)), (e, (r,)), (e, (r, n)))` |
//! | pin | `((e, (r, r)), (e, (r, n)))` |
//! | pni | `((e, (r, r, n)), (e, (r,)))` |
//! | inp | `(((e, (r,)), (e, (r, n))), (r,))` |
//! | 2u | `((e, (r,)), (e, (r,)), (u,))` |
//! | up | `(((e, (r,)), (e, (r,)), (u,)), (r,))` |

use crate::{ReasonError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leaf symbol of a query structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Entity,
    Relation,
    Negation,
    Union,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Self::Entity => 'e',
            Self::Relation => 'r',
            Self::Negation => 'n',
            Self::Union => 'u',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'e' => Some(Self::Entity),
            'r' => Some(Self::Relation),
            'n' => Some(Self::Negation),
            'u' => Some(Self::Union),
            _ => None,
        }
    }
}

/// A nested-tuple query structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Symbol(Symbol),
    Tuple(Vec<Shape>),
}

impl Shape {
    pub fn tuple(items: impl IntoIterator<Item = Shape>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// `(s1, s2, ...)` of bare symbols, e.g. the hop chain `(r, r, n)`.
    pub fn symbols(symbols: &[Symbol]) -> Self {
        Self::tuple(symbols.iter().copied().map(Self::Symbol))
    }

    /// `(e, (hops...))`: an anchored hop chain.
    pub fn atom(hops: &[Symbol]) -> Self {
        Self::tuple([Self::Symbol(Symbol::Entity), Self::symbols(hops)])
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Self::Symbol(s) => Some(*s),
            Self::Tuple(_) => None,
        }
    }

    pub fn items(&self) -> &[Shape] {
        match self {
            Self::Symbol(_) => &[],
            Self::Tuple(items) => items,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, "{}", s.as_char()),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for Shape {
    type Err = ReasonError;

    /// Parse tuple notation such as `(e, (r, r))` or `('e', ('r',))`.
    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<char> = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
            .collect();
        let mut parser = ShapeParser { tokens: &tokens, pos: 0 };
        let shape = parser.shape()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(shape)
    }
}

struct ShapeParser<'a> {
    tokens: &'a [char],
    pos: usize,
}

impl ShapeParser<'_> {
    fn error(&self, msg: &str) -> ReasonError {
        let rest: String = self.tokens[self.pos.min(self.tokens.len())..].iter().collect();
        ReasonError::UnknownStructure(format!("{msg} at '{rest}'"))
    }

    fn shape(&mut self) -> Result<Shape> {
        match self.tokens.get(self.pos) {
            Some('(') => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    if self.tokens.get(self.pos) == Some(&')') {
                        self.pos += 1;
                        break;
                    }
                    items.push(self.shape()?);
                    match self.tokens.get(self.pos) {
                        Some(',') => self.pos += 1,
                        Some(')') => {}
                        _ => return Err(self.error("expected ',' or ')'")),
                    }
                }
                if items.is_empty() {
                    return Err(self.error("empty tuple"));
                }
                Ok(Shape::Tuple(items))
            }
            Some(&c) => {
                let symbol = Symbol::from_char(c).ok_or_else(|| self.error("unknown symbol"))?;
                self.pos += 1;
                Ok(Shape::Symbol(symbol))
            }
            None => Err(self.error("unexpected end")),
        }
    }
}

/// The fourteen supported query types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "1p")]
    OneHop,
    #[serde(rename = "2p")]
    TwoHop,
    #[serde(rename = "3p")]
    ThreeHop,
    #[serde(rename = "2i")]
    TwoIntersect,
    #[serde(rename = "3i")]
    ThreeIntersect,
    #[serde(rename = "pi")]
    HopIntersect,
    #[serde(rename = "ip")]
    IntersectHop,
    #[serde(rename = "2in")]
    TwoIntersectNeg,
    #[serde(rename = "3in")]
    ThreeIntersectNeg,
    #[serde(rename = "pin")]
    HopIntersectNeg,
    #[serde(rename = "pni")]
    NegHopIntersect,
    #[serde(rename = "inp")]
    IntersectNegHop,
    #[serde(rename = "2u")]
    TwoUnion,
    #[serde(rename = "up")]
    UnionHop,
}

impl QueryType {
    pub const ALL: [QueryType; 14] = [
        Self::OneHop,
        Self::TwoHop,
        Self::ThreeHop,
        Self::TwoIntersect,
        Self::ThreeIntersect,
        Self::HopIntersect,
        Self::IntersectHop,
        Self::TwoIntersectNeg,
        Self::ThreeIntersectNeg,
        Self::HopIntersectNeg,
        Self::NegHopIntersect,
        Self::IntersectNegHop,
        Self::TwoUnion,
        Self::UnionHop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHop => "1p",
            Self::TwoHop => "2p",
            Self::ThreeHop => "3p",
            Self::TwoIntersect => "2i",
            Self::ThreeIntersect => "3i",
            Self::HopIntersect => "pi",
            Self::IntersectHop => "ip",
            Self::TwoIntersectNeg => "2in",
            Self::ThreeIntersectNeg => "3in",
            Self::HopIntersectNeg => "pin",
            Self::NegHopIntersect => "pni",
            Self::IntersectNegHop => "inp",
            Self::TwoUnion => "2u",
            Self::UnionHop => "up",
        }
    }

    /// The structure this type names.
    pub fn structure(self) -> Shape {
        use Symbol::{Negation as N, Relation as R, Union as U};

        let p1 = || Shape::atom(&[R]);
        match self {
            Self::OneHop => p1(),
            Self::TwoHop => Shape::atom(&[R, R]),
            Self::ThreeHop => Shape::atom(&[R, R, R]),
            Self::TwoIntersect => Shape::tuple([p1(), p1()]),
            Self::ThreeIntersect => Shape::tuple([p1(), p1(), p1()]),
            Self::HopIntersect => Shape::tuple([Shape::atom(&[R, R]), p1()]),
            Self::IntersectHop => Shape::tuple([Shape::tuple([p1(), p1()]), Shape::symbols(&[R])]),
            Self::TwoIntersectNeg => Shape::tuple([p1(), Shape::atom(&[R, N])]),
            Self::ThreeIntersectNeg => Shape::tuple([p1(), p1(), Shape::atom(&[R, N])]),
            Self::HopIntersectNeg => Shape::tuple([Shape::atom(&[R, R]), Shape::atom(&[R, N])]),
            Self::NegHopIntersect => Shape::tuple([Shape::atom(&[R, R, N]), p1()]),
            Self::IntersectNegHop => Shape::tuple([
                Shape::tuple([p1(), Shape::atom(&[R, N])]),
                Shape::symbols(&[R]),
            ]),
            Self::TwoUnion => Shape::tuple([p1(), p1(), Shape::symbols(&[U])]),
            Self::UnionHop => Shape::tuple([
                Shape::tuple([p1(), p1(), Shape::symbols(&[U])]),
                Shape::symbols(&[R]),
            ]),
        }
    }

    /// The query type of a structure; fails for unsupported shapes.
    pub fn classify(shape: &Shape) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.structure() == *shape)
            .ok_or_else(|| ReasonError::UnknownStructure(shape.to_string()))
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = ReasonError;

    /// Accepts the short tags and the `-DNF` spellings of the union types.
    fn from_str(s: &str) -> Result<Self> {
        let tag = match s {
            "2u-DNF" => "2u",
            "up-DNF" => "up",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| ReasonError::UnknownQueryType(s.to_string()))
    }
}

/// The structure named by `query_type`.
///
/// This is the validation gate in front of evaluation: unknown tags fail here,
/// before any model call.
pub fn match_structure(query_type: &str) -> Result<Shape> {
    Ok(query_type.parse::<QueryType>()?.structure())
}

/// Inverse of [`match_structure`].
pub fn classify(shape: &Shape) -> Result<QueryType> {
    QueryType::classify(shape)
}
