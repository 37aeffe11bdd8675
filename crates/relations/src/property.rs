//! The grounded/fresh dispatch shared by property-style relations.
//!
//! For `R(elem, value)`:
//! - `elem` grounded: one oracle query, unified against `value` (this both
//!   tests a grounded value and binds a fresh one).
//! - `elem` fresh: every root-scope candidate in oracle order, one query each,
//!   one answer per candidate whose value unifies.

use crate::binding::Binding;
use crate::context::{QueryContext, Relation};
use crate::fault::absent_on_fault;
use domlogic_core::{ElementHandle, Error, Oracle, OracleResult};
use domlogic_kanren::{lazy, mzero, unit, Goal, Stream, Substitution, Term};
use tracing::debug;

/// Reads one property of an element; `None` means the element has no such value.
pub type Fetch = fn(&dyn Oracle, &ElementHandle) -> OracleResult<Option<Term>>;

pub(crate) fn failure(e: impl Into<Error>) -> Stream {
    Box::new(std::iter::once(Err(e.into())))
}

pub(crate) fn unified(s: &Substitution, u: &Term, v: &Term) -> Stream {
    match s.unify(u, v) {
        Some(s) => unit(s),
        None => mzero(),
    }
}

/// Enumerates the root scope when first pulled and feeds each candidate to `f`.
///
/// The scope is read from `ctx` at that moment. Enumeration faults of any
/// kind abort the query: there is no single candidate to blame them on.
pub(crate) fn each_root_candidate(
    ctx: &QueryContext,
    s: Substitution,
    f: impl Fn(&QueryContext, &Substitution, ElementHandle) -> Stream + 'static,
) -> Stream {
    let ctx = ctx.clone();
    lazy(move || -> Stream {
        let scope = ctx.scope().root.clone();
        let enumerated = ctx.oracle().enumerate(&scope);
        match enumerated {
            Ok(candidates) => {
                debug!(scope = %scope, candidates = candidates.len(), "Enumerated root scope");
                Box::new(candidates.into_iter().flat_map(move |el| f(&ctx, &s, el)))
            }
            Err(e) => failure(e),
        }
    })
}

/// Resolves `fetch` on a known element and unifies the result with `value`.
pub(crate) fn resolve(
    ctx: &QueryContext,
    s: &Substitution,
    element: &ElementHandle,
    value: &Term,
    fetch: Fetch,
) -> Stream {
    match absent_on_fault(fetch(ctx.oracle(), element), element) {
        Ok(Some(Some(actual))) => unified(s, value, &actual),
        Ok(_) => mzero(),
        Err(e) => failure(e),
    }
}

/// Builds `R(elem, value)` from a property reader.
pub fn element_property(elem: impl Into<Term>, value: impl Into<Term>, fetch: Fetch) -> Relation {
    let elem = elem.into();
    let value = value.into();
    Goal::new(move |ctx: &QueryContext, s: Substitution| {
        let elem = elem.clone();
        let value = value.clone();
        let ctx = ctx.clone();
        lazy(move || -> Stream {
            match Binding::of(&s, &elem) {
                Binding::Grounded(Term::Element(el)) => resolve(&ctx, &s, &el, &value, fetch),
                Binding::Grounded(_) => mzero(),
                Binding::Fresh => each_root_candidate(&ctx, s, move |ctx, s, el| {
                    match s.unify(&elem, &Term::Element(el.clone())) {
                        Some(s) => resolve(ctx, &s, &el, &value, fetch),
                        None => mzero(),
                    }
                }),
            }
        })
    })
}
