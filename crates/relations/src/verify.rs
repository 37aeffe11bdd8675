//! Checks over relations, for tests and for diagnosing a live page.
//!
//! All of them run the solver for real, so an unexpected oracle fault
//! surfaces as `Err` rather than as a failed check.

use crate::context::{QueryContext, Relation};
use crate::predicate::{displayed, exists, present};
use domlogic_core::{ElementHandle, Result};
use domlogic_kanren::{conj, run, solve, Term};

/// The goal has at least one solution.
pub fn holds(ctx: &QueryContext, goal: &Relation) -> Result<bool> {
    match solve(ctx, goal).next() {
        Some(Ok(_)) => Ok(true),
        Some(Err(e)) => Err(e),
        None => Ok(false),
    }
}

/// The goal has no solution.
pub fn fails(ctx: &QueryContext, goal: &Relation) -> Result<bool> {
    holds(ctx, goal).map(|h| !h)
}

/// Pulls the whole stream.
pub fn solution_count(ctx: &QueryContext, goal: &Relation) -> Result<usize> {
    solve(ctx, goal).try_fold(0, |n, item| item.map(|_| n + 1))
}

/// The single answer for `q`, or `None` when there are zero or several.
pub fn unique_solution(
    ctx: &QueryContext,
    f: impl FnOnce(Term) -> Relation,
) -> Result<Option<Term>> {
    let mut answers = run(ctx, Some(2), f)?;
    Ok(if answers.len() == 1 { answers.pop() } else { None })
}

/// Grounded/fresh agreement of a binary relation at `(a, b)`.
///
/// When `rel(a, b)` holds, `rel(a, y)` must produce `b` and `rel(x, b)` must
/// produce `a`. Returns `true` when `rel(a, b)` does not hold.
pub fn modes_agree<R>(ctx: &QueryContext, rel: R, a: Term, b: Term) -> Result<bool>
where
    R: Fn(Term, Term) -> Relation,
{
    if !holds(ctx, &rel(a.clone(), b.clone()))? {
        return Ok(true);
    }
    let forward = run(ctx, None, |y| rel(a.clone(), y))?;
    let backward = run(ctx, None, |x| rel(x, b.clone()))?;
    Ok(forward.contains(&b) && backward.contains(&a))
}

/// `present(el)` holds exactly when `exists(el)` and `displayed(el)` both do.
pub fn present_agrees(ctx: &QueryContext, el: &ElementHandle) -> Result<bool> {
    let lhs = holds(ctx, &present(el.clone()))?;
    let rhs = holds(ctx, &conj(exists(el.clone()), displayed(el.clone())))?;
    Ok(lhs == rhs)
}
