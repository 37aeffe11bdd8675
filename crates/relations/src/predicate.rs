//! Unary element predicates.
//!
//! Each one succeeds for an element whose oracle answer is `true`. With the
//! element fresh, it enumerates the root-scope elements for which the answer
//! is `true`.

use crate::context::Relation;
use crate::property::element_property;
use domlogic_kanren::Term;

macro_rules! predicate {
    ($(#[$doc:meta])* $name:ident => $query:ident) => {
        $(#[$doc])*
        pub fn $name(elem: impl Into<Term>) -> Relation {
            element_property(elem, true, |oracle, el| {
                oracle.$query(el).map(|b| Some(Term::Bool(b)))
            })
        }
    };
}

predicate!(
    /// Rendered with a non-empty layout box.
    displayed => is_displayed
);
predicate!(
    /// Not disabled.
    enabled => is_enabled
);
predicate!(
    /// Still attached to the current document.
    exists => exists
);
predicate!(
    /// Exists and is displayed.
    present => is_present
);
predicate!(
    /// A checked box or radio button, or a chosen option.
    selected => is_selected
);
predicate!(visible => is_visible);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::with_scope;
    use crate::fixture::sample_document;
    use domlogic_core::{Oracle, ScopeOverride};
    use domlogic_kanren::{conj, run};

    #[test]
    fn test_enabled() {
        let (doc, ctx) = sample_document();
        let disabled = doc.by_id("disabled_field").unwrap();
        let name = doc.by_id("name_field").unwrap();
        assert!(run(&ctx, None, |_| enabled(disabled)).unwrap().is_empty());
        assert_eq!(run(&ctx, None, |_| enabled(name)).unwrap().len(), 1);
    }

    #[test]
    fn test_selected_enumerates_chosen_controls() {
        let (doc, ctx) = sample_document();
        let found = run(&ctx, None, |q| selected(q)).unwrap();
        let remember = doc.by_id("remember").unwrap();
        let option_b = doc.enumerate("option[value=b]").unwrap().remove(0);
        assert_eq!(found, vec![Term::from(remember), Term::from(option_b)]);
    }

    #[test]
    fn test_present_agrees_with_exists_and_displayed() {
        let (doc, ctx) = sample_document();
        for el in doc.handles() {
            let present_n = run(&ctx, None, |_| present(el.clone())).unwrap().len();
            let both_n = run(&ctx, None, |_| conj(exists(el.clone()), displayed(el.clone())))
                .unwrap()
                .len();
            assert_eq!(present_n, both_n, "{}", el);
        }
    }

    #[test]
    fn test_displayed_and_visible_differ() {
        let (doc, ctx) = sample_document();
        let faded = doc.by_id("faded").unwrap();
        let hidden = doc.by_id("hidden-note").unwrap();
        assert_eq!(run(&ctx, None, |_| displayed(faded.clone())).unwrap().len(), 1);
        assert!(run(&ctx, None, |_| visible(faded)).unwrap().is_empty());
        assert!(run(&ctx, None, |_| displayed(hidden)).unwrap().is_empty());
    }

    #[test]
    fn test_exists_fails_after_navigation() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        assert_eq!(run(&ctx, None, |_| exists(table.clone())).unwrap().len(), 1);
        doc.navigate("http://localhost:8080/other", "<title>Elsewhere</title>");
        assert!(run(&ctx, None, |_| exists(table)).unwrap().is_empty());
    }

    #[test]
    fn test_scoped_enabled_inputs() {
        let (doc, ctx) = sample_document();
        let inputs = run(&ctx, None, |q| {
            with_scope(ScopeOverride::root("input"), enabled(q))
        })
        .unwrap();
        let expected: Vec<Term> = ["name_field", "remember"]
            .iter()
            .map(|id| Term::from(doc.by_id(id).unwrap()))
            .collect();
        assert_eq!(inputs, expected);
    }

    #[test]
    fn test_non_element_fails() {
        let (_, ctx) = sample_document();
        assert!(run(&ctx, None, |_| displayed("pages-table")).unwrap().is_empty());
    }
}
