//! A small relational solver in the miniKanren tradition.
//!
//! Goals map a substitution to a lazy stream of substitutions. Every goal is
//! applied with an explicit environment `C` (for the DOM relations this is
//! the query context), so ambient settings travel with the search instead of
//! living in globals.

pub mod goal;
pub mod substitution;
pub mod term;

pub use goal::{
    conj, conj_all, disj, disj_all, eq, fail, fresh, fresh2, lazy, member_of, mzero, once, run,
    solve, succeed, unit, Goal, Stream,
};
pub use substitution::Substitution;
pub use term::{Term, Var};
