//! Ranked default-reasoning engine: possible worlds over a restricted
//! first-order signature, tolerance pairs, and a System-Z-like ranking
//! construction.
//!
//! Single-threaded core with no locks and no async: long-running searches
//! (C7) accept a `&mut dyn FnMut(f64) -> bool` progress/cancellation
//! callback instead, so a host can poll or offload to a worker thread
//! itself.

pub mod csv;
pub mod error;
pub mod explain;
pub mod formula;
pub mod grounding;
pub mod kb_text;
pub mod rank;
pub mod satisfaction;
pub mod search;
pub mod systemz;
pub mod tolerance;
pub mod validator;
pub mod world;

pub use error::{CapacityError, CoreError, InputError};
pub use explain::ExplanationNode;
pub use formula::{Conditional, Constant, Formula, KnowledgeBase, Literal, Predicate, RelationalAtom, Term, Variable};
pub use kb_text::{load_kb, parse_query, QueryTarget};
pub use rank::{
    accepts_conditional, accepts_formula, accepts_kb, accepts_ground_conditional, rank_of_conditional,
    rank_of_formula, representatives, weak_representatives, Rank, RankingFunction,
};
pub use search::{search_tolerance_pairs, Progress, SearchStrategy};
pub use systemz::build_ranking;
pub use tolerance::{PartitionBlock, TolerancePair, Witness};
pub use world::WorldSet;
