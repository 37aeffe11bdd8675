//! Facts about the page as a whole.
//!
//! Each holds for exactly one value at a time, so these relations yield at
//! most one answer and never enumerate elements.

use crate::context::{QueryContext, Relation};
use crate::fault::absent_on_fault;
use crate::property::{failure, unified};
use domlogic_core::{Oracle, OracleResult};
use domlogic_kanren::{lazy, mzero, Goal, Stream, Substitution, Term};

fn page_fact(value: Term, what: &'static str, read: fn(&dyn Oracle) -> OracleResult<String>) -> Relation {
    Goal::new(move |ctx: &QueryContext, s: Substitution| {
        let value = value.clone();
        let ctx = ctx.clone();
        lazy(move || -> Stream {
            match absent_on_fault(read(ctx.oracle()), &what) {
                Ok(Some(actual)) => unified(&s, &value, &Term::from(actual)),
                Ok(None) => mzero(),
                Err(e) => failure(e),
            }
        })
    })
}

/// `t` is the title of the current page.
pub fn title(t: impl Into<Term>) -> Relation {
    page_fact(t.into(), "page title", |oracle| oracle.title())
}

/// `u` is the URL of the current page.
pub fn current_url(u: impl Into<Term>) -> Relation {
    page_fact(u.into(), "current URL", |oracle| oracle.current_url())
}
