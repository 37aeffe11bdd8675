//! `child_of(child, parent)`: `child` lies beneath `parent` in the child scope.
//!
//! With the default child scope ("*") that means any descendant, not only
//! direct children.

use crate::binding::Binding;
use crate::context::{QueryContext, Relation};
use crate::fault::absent_on_fault;
use crate::property::{each_root_candidate, failure, unified};
use domlogic_core::{ElementHandle, Result};
use domlogic_kanren::{lazy, mzero, unit, Goal, Stream, Substitution, Term};

pub fn child_of(child: impl Into<Term>, parent: impl Into<Term>) -> Relation {
    let child = child.into();
    let parent = parent.into();
    Goal::new(move |ctx: &QueryContext, s: Substitution| {
        let child = child.clone();
        let parent = parent.clone();
        let ctx = ctx.clone();
        lazy(move || -> Stream {
            match (Binding::of(&s, &child), Binding::of(&s, &parent)) {
                (Binding::Grounded(Term::Element(c)), Binding::Grounded(Term::Element(p))) => {
                    match children(&ctx, &p) {
                        Ok(Some(below)) if below.contains(&c) => unit(s),
                        Ok(_) => mzero(),
                        Err(e) => failure(e),
                    }
                }
                (Binding::Fresh, Binding::Grounded(Term::Element(p))) => {
                    bind_children(&ctx, &s, &child, &p)
                }
                (Binding::Grounded(c), _) if c.as_element().is_none() => mzero(),
                (_, Binding::Grounded(_)) => mzero(),
                // Parent unknown: every root-scope element is a candidate
                // parent, and its descendants are tested against `child`.
                (_, Binding::Fresh) => each_root_candidate(&ctx, s, move |ctx, s, p| {
                    match s.unify(&parent, &Term::Element(p.clone())) {
                        Some(s) => bind_children(ctx, &s, &child, &p),
                        None => mzero(),
                    }
                }),
            }
        })
    })
}

/// Descendants of `parent` in the child scope; `None` when the parent went stale.
fn children(ctx: &QueryContext, parent: &ElementHandle) -> Result<Option<Vec<ElementHandle>>> {
    absent_on_fault(
        ctx.oracle().enumerate_children(parent, &ctx.scope().child),
        parent,
    )
}

fn bind_children(ctx: &QueryContext, s: &Substitution, child: &Term, parent: &ElementHandle) -> Stream {
    match children(ctx, parent) {
        Ok(Some(below)) => {
            let s = s.clone();
            let child = child.clone();
            Box::new(
                below
                    .into_iter()
                    .flat_map(move |c| unified(&s, &child, &Term::Element(c))),
            )
        }
        Ok(None) => mzero(),
        Err(e) => failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::attribute;
    use crate::context::with_scope;
    use crate::content::tag;
    use crate::fixture::{document, sample_document};
    use domlogic_browser::{Fault, MemoryOracle};
    use domlogic_core::{Error, Oracle, ScopeOverride};
    use domlogic_kanren::{conj, eq, fresh, run};

    fn tags(doc: &MemoryOracle, answers: &[Term]) -> Vec<String> {
        answers
            .iter()
            .map(|t| doc.tag_name(t.as_element().unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_both_grounded_membership() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let field = doc.by_id("name_field").unwrap();
        let cells = doc.enumerate("td").unwrap();
        assert_eq!(run(&ctx, None, |_| child_of(cells[0].clone(), table.clone())).unwrap().len(), 1);
        assert!(run(&ctx, None, |_| child_of(field, table)).unwrap().is_empty());
    }

    #[test]
    fn test_parent_grounded_enumerates_descendants() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let below = run(&ctx, None, |q| child_of(q, table)).unwrap();
        assert_eq!(tags(&doc, &below), vec!["tbody", "tr", "td", "td"]);
    }

    #[test]
    fn test_child_grounded_finds_all_ancestors() {
        let (doc, ctx) = sample_document();
        let cell = doc.enumerate("td").unwrap().remove(0);
        let ancestors = run(&ctx, None, |q| child_of(cell, q)).unwrap();
        assert_eq!(tags(&doc, &ancestors), vec!["html", "body", "table", "tbody", "tr"]);
    }

    #[test]
    fn test_neither_grounded_pairs() {
        let (_, ctx) = document("<ul><li>a</li><li>b</li></ul>");
        let pairs = run(&ctx, None, |q| {
            fresh(move |c| {
                let q = q.clone();
                fresh(move |p| {
                    with_scope(
                        ScopeOverride::root("ul, li"),
                        conj(
                            child_of(c.clone(), p.clone()),
                            eq(q.clone(), Term::List(vec![c.clone(), p])),
                        ),
                    )
                })
            })
        })
        .unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_order_independent_of_binding_first() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let bind_parent_first = run(&ctx, None, |q| {
            let table = table.clone();
            fresh(move |p| conj(eq(p.clone(), table.clone()), child_of(q.clone(), p)))
        })
        .unwrap();
        let bind_parent_last = run(&ctx, None, |q| {
            let table = table.clone();
            fresh(move |p| conj(child_of(q.clone(), p.clone()), eq(p, table.clone())))
        })
        .unwrap();
        assert_eq!(bind_parent_first, bind_parent_last);
        assert_eq!(bind_parent_first.len(), 4);
    }

    #[test]
    fn test_child_scope_override() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let cells = run(&ctx, None, |q| {
            with_scope(ScopeOverride::child("td"), child_of(q, table))
        })
        .unwrap();
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_root_scope_read_at_enumeration() {
        let (doc, ctx) = sample_document();
        let cell = doc.enumerate("td").unwrap().remove(0);
        let scoped = run(&ctx, None, |q| {
            with_scope(ScopeOverride::root("table"), child_of(cell, q))
        })
        .unwrap();
        assert_eq!(scoped, vec![Term::from(doc.by_id("pages-table").unwrap())]);
    }

    #[test]
    fn test_stale_parent_is_no_value() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        doc.detach(&table);
        assert!(run(&ctx, None, |q| child_of(q, table)).unwrap().is_empty());
    }

    #[test]
    fn test_unexpected_fault_on_candidate_parent_aborts() {
        let (doc, ctx) = document("<div><p>x</p></div>");
        let p = doc.enumerate("p").unwrap().remove(0);
        doc.fail_element(&p, Fault::Unexpected);
        let result = run(&ctx, None, |q| fresh(move |p| child_of(q.clone(), p)));
        assert!(matches!(result, Err(Error::Oracle(_))));
    }

    #[test]
    fn test_compose_with_attribute() {
        let (doc, ctx) = sample_document();
        let rows = run(&ctx, None, |q| {
            fresh(move |t| {
                conj(
                    attribute(t.clone(), "id", "pages-table"),
                    child_of(q.clone(), t),
                )
            })
        })
        .unwrap();
        assert_eq!(tags(&doc, &rows), vec!["tbody", "tr", "td", "td"]);
    }

    #[test]
    fn test_descendant_selector_scopes() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let cells = run(&ctx, None, |q| {
            with_scope(ScopeOverride::child("tr > td:first-child"), child_of(q, table))
        })
        .unwrap();
        assert_eq!(cells, vec![Term::from(doc.enumerate("td").unwrap().remove(0))]);

        let parents = run(&ctx, None, |q| {
            fresh(move |c| {
                with_scope(
                    ScopeOverride::root("table, form"),
                    conj(child_of(c.clone(), q.clone()), tag(c, "option")),
                )
            })
        })
        .unwrap();
        assert_eq!(tags(&doc, &parents), vec!["form", "form"]);
    }
}
