//! Knowledge Graph Embedding inference interfaces.
//!
//! Knowledge graphs store facts as (head, relation, tail) triples:
//! `(Einstein, won, NobelPrize)`, `(Paris, capitalOf, France)`.
//! A trained KGE model assigns every candidate triple a plausibility score;
//! this crate is the read-only boundary to such a model.
//!
//! ## Pieces
//!
//! | Item | Role |
//! |------|------|
//! | [`KgIndex`] | Bidirectional name ↔ dense id mapping for entities and relations |
//! | [`ScoreOracle`] | Single-hop scoring: `(h, r, ?)` → one logit per entity |
//! | [`Logits`] / [`ScoreVector`] | Raw vs calibrated (\[0, 1\]) score vectors |
//! | [`Predictor`] | Link prediction: missing head / relation / tail, top-k, chains |
//! | [`SemanticConstraints`] | Per-relation domain/range masks for head and tail prediction |
//! | [`find_missing_triples`] | Confident predictions absent from the known graph |
//! | [`Evaluator`] | Filtered and raw MRR / MR / Hits@k over test triples |
//! | [`ScoreTable`] | In-memory oracle over precomputed logits |
//!
//! ## Calibration
//!
//! Models emit logits in (-∞, +∞). Anything that combines scores with fuzzy
//! logic needs probabilities, obtained with the logistic sigmoid:
//!
//! ```text
//! p = 1 / (1 + e^(-logit))
//! ```
//!
//! [`ScoreVector`] can only be constructed from values in \[0, 1\], so raw
//! logits cannot leak into a t-norm by accident.
//!
//! ## Usage
//!
//! ```rust
//! use cqa_kge::{EntityId, KgIndex, LinkQuery, Predictor, RelationId, ScoreTable};
//!
//! let index = KgIndex::from_names(["A", "B", "C"], ["knows"]).unwrap();
//! let mut table = ScoreTable::new(3, 1);
//! table.set_probabilities(EntityId(0), RelationId(0), &[0.1, 0.9, 0.5]).unwrap();
//!
//! let predictor = Predictor::new(&table, &index).unwrap();
//! let query = LinkQuery::from_names(&index, Some("A"), Some("knows"), None).unwrap();
//! let top = predictor.predict_topk(&query, 1).unwrap();
//! assert_eq!(top[0].name, "B");
//! ```

mod constraints;
mod error;
pub mod evaluation;
mod index;
pub mod missing;
mod oracle;
pub mod predict;
mod scores;
mod table;

pub use constraints::SemanticConstraints;
pub use error::{Error, Result};
pub use evaluation::{Evaluator, RankMetrics};
pub use index::{EntityId, IdTriple, KgIndex, RelationId, Vocabulary};
pub use missing::{find_missing_triples, MissingTripleConfig};
pub use oracle::ScoreOracle;
pub use predict::{ConjunctiveAnswer, LinkQuery, Predictor};
pub use scores::{
    check_probabilities, logit, sigmoid, top_k, Logits, Prediction, ScoreVector,
    PROBABILITY_EPSILON,
};
pub use table::ScoreTable;
