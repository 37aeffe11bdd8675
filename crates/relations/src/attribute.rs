//! `attribute(elem, name, value)`: `elem` carries attribute `name` with `value`.
//!
//! The oracle cannot list an element's attributes, so a fresh `name` is
//! resolved by probing every entry of [`KNOWN_ATTRIBUTES`]. With both `elem`
//! and `name` fresh that is one query per candidate per vocabulary entry;
//! narrow the root scope when that matters.

use crate::binding::Binding;
use crate::context::{QueryContext, Relation};
use crate::fault::absent_on_fault;
use crate::property::{each_root_candidate, failure, unified};
use crate::vocabulary::KNOWN_ATTRIBUTES;
use domlogic_core::ElementHandle;
use domlogic_kanren::{lazy, mzero, Goal, Stream, Substitution, Term};

pub fn attribute(
    elem: impl Into<Term>,
    name: impl Into<Term>,
    value: impl Into<Term>,
) -> Relation {
    let elem = elem.into();
    let name = name.into();
    let value = value.into();
    Goal::new(move |ctx: &QueryContext, s: Substitution| {
        let elem = elem.clone();
        let name = name.clone();
        let value = value.clone();
        let ctx = ctx.clone();
        lazy(move || -> Stream {
            let name_binding = Binding::of(&s, &name);
            if matches!(&name_binding, Binding::Grounded(t) if t.as_str().is_none()) {
                return mzero();
            }
            match Binding::of(&s, &elem) {
                Binding::Grounded(Term::Element(el)) => {
                    on_element(&ctx, &s, &el, &name_binding, &name, &value)
                }
                Binding::Grounded(_) => mzero(),
                Binding::Fresh => each_root_candidate(&ctx, s, move |ctx, s, el| {
                    match s.unify(&elem, &Term::Element(el.clone())) {
                        Some(s) => on_element(ctx, &s, &el, &name_binding, &name, &value),
                        None => mzero(),
                    }
                }),
            }
        })
    })
}

fn on_element(
    ctx: &QueryContext,
    s: &Substitution,
    el: &ElementHandle,
    name_binding: &Binding,
    name: &Term,
    value: &Term,
) -> Stream {
    match name_binding {
        Binding::Grounded(Term::Str(n)) => named(ctx, s, el, n, value),
        Binding::Grounded(_) => mzero(),
        Binding::Fresh => scan_vocabulary(ctx, s, el, name, value),
    }
}

fn named(ctx: &QueryContext, s: &Substitution, el: &ElementHandle, name: &str, value: &Term) -> Stream {
    match absent_on_fault(ctx.oracle().attribute(el, name), el) {
        Ok(Some(Some(actual))) => unified(s, value, &Term::from(actual)),
        Ok(_) => mzero(),
        Err(e) => failure(e),
    }
}

/// One answer per known attribute the element carries, in vocabulary order.
fn scan_vocabulary(
    ctx: &QueryContext,
    s: &Substitution,
    el: &ElementHandle,
    name: &Term,
    value: &Term,
) -> Stream {
    let ctx = ctx.clone();
    let s = s.clone();
    let el = el.clone();
    let name = name.clone();
    let value = value.clone();
    Box::new(KNOWN_ATTRIBUTES.iter().flat_map(move |attr| -> Stream {
        match s.unify(&name, &Term::from(*attr)) {
            Some(s) => named(&ctx, &s, &el, attr, &value),
            None => mzero(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{document, sample_document};
    use domlogic_browser::Fault;
    use domlogic_core::{Error, Oracle};
    use domlogic_kanren::{conj, eq, fresh2, run};

    #[test]
    fn test_find_by_id() {
        let (doc, ctx) = sample_document();
        let found = run(&ctx, None, |q| attribute(q, "id", "pages-table")).unwrap();
        assert_eq!(found, vec![Term::from(doc.by_id("pages-table").unwrap())]);

        let none = run(&ctx, None, |q| attribute(q, "id", "no-such-id")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_bind_value_of_grounded_element() {
        let (doc, ctx) = sample_document();
        let input = doc.by_id("name_field").unwrap();
        let values = run(&ctx, None, |q| attribute(input, "type", q)).unwrap();
        assert_eq!(values, vec![Term::from("text")]);
    }

    #[test]
    fn test_grounded_check() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let yes = run(&ctx, None, |_| attribute(table.clone(), "class", "listing")).unwrap();
        assert_eq!(yes.len(), 1);
        let no = run(&ctx, None, |_| attribute(table, "class", "other")).unwrap();
        assert!(no.is_empty());
    }

    #[test]
    fn test_fresh_name_scans_vocabulary() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let pairs = run(&ctx, None, |q| {
            fresh2(move |n, v| {
                conj(
                    attribute(table.clone(), n.clone(), v.clone()),
                    eq(q.clone(), Term::List(vec![n, v])),
                )
            })
        })
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                Term::List(vec!["id".into(), "pages-table".into()]),
                Term::List(vec!["class".into(), "listing".into()]),
            ]
        );
    }

    #[test]
    fn test_non_string_name_fails() {
        let (_, ctx) = sample_document();
        let found = run(&ctx, None, |q| attribute(q, 42, "pages-table")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_first_answer_is_lazy() {
        let (doc, ctx) = sample_document();
        let found = run(&ctx, Some(1), |q| attribute(q, "id", "pages-table")).unwrap();
        assert_eq!(found.len(), 1);
        let table_position = doc
            .handles()
            .iter()
            .position(|h| Some(h) == doc.by_id("pages-table").as_ref())
            .unwrap();
        // One enumeration plus one attribute read per candidate up to the match.
        assert_eq!(doc.calls(), 1 + table_position + 1);
    }

    #[test]
    fn test_recognized_fault_skips_candidate() {
        let (doc, ctx) = document(r#"<div id="root"><p id="a"></p><p id="b"></p><p id="c"></p></div>"#);
        doc.fail_element(&doc.by_id("a").unwrap(), Fault::InvalidElementState);
        doc.fail_element(&doc.by_id("b").unwrap(), Fault::UnknownServer);
        let found = run(&ctx, None, |q| attribute(q, "id", Term::var())).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_unexpected_fault_aborts() {
        let (doc, ctx) = document(r#"<div id="first"><p>x</p></div>"#);
        doc.fail_element(&doc.enumerate("p").unwrap().remove(0), Fault::Unexpected);
        let result = run(&ctx, None, |q| attribute(q, "id", Term::var()));
        assert!(matches!(result, Err(Error::Oracle(_))));
    }
}
