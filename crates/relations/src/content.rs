//! `tag(elem, name)` and `text(elem, content)`.

use crate::context::Relation;
use crate::property::element_property;
use domlogic_kanren::Term;

/// `name` is the lower-case tag name of `elem`.
pub fn tag(elem: impl Into<Term>, name: impl Into<Term>) -> Relation {
    element_property(elem, name, |oracle, el| {
        oracle.tag_name(el).map(|t| Some(Term::from(t.to_lowercase())))
    })
}

/// `content` is the rendered text of `elem`.
pub fn text(elem: impl Into<Term>, content: impl Into<Term>) -> Relation {
    element_property(elem, content, |oracle, el| oracle.text(el).map(|t| Some(Term::from(t))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::with_scope;
    use crate::fixture::sample_document;
    use domlogic_core::ScopeOverride;
    use domlogic_kanren::{conj, run};

    #[test]
    fn test_tag_of_grounded_element() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        assert_eq!(run(&ctx, None, |q| tag(table.clone(), q)).unwrap(), vec![Term::from("table")]);
        assert!(run(&ctx, None, |_| tag(table, "div")).unwrap().is_empty());
    }

    #[test]
    fn test_elements_by_tag() {
        let (_, ctx) = sample_document();
        assert_eq!(run(&ctx, None, |q| tag(q, "input")).unwrap().len(), 3);
        assert_eq!(run(&ctx, Some(2), |q| tag(q, "td")).unwrap().len(), 2);
    }

    #[test]
    fn test_text_binds_and_finds() {
        let (doc, ctx) = sample_document();
        let heading = run(&ctx, None, |q| conj(tag(q.clone(), "h1"), text(q, "Ministache"))).unwrap();
        assert_eq!(heading.len(), 1);

        let note = doc.by_id("hidden-note").unwrap();
        assert_eq!(run(&ctx, None, |q| text(note, q)).unwrap(), vec![Term::from("secret")]);
    }

    #[test]
    fn test_stale_element_has_no_tag() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        doc.detach(&table);
        assert!(run(&ctx, None, |q| tag(table, q)).unwrap().is_empty());
    }

    #[test]
    fn test_root_scope_accepts_css_selectors() {
        let (_, ctx) = sample_document();
        let tags_in = |scope: &'static str| {
            run(&ctx, None, |q| {
                with_scope(ScopeOverride::root(scope), tag(Term::var(), q))
            })
            .unwrap()
        };
        assert_eq!(tags_in("table td"), vec![Term::from("td"), Term::from("td")]);
        assert_eq!(
            tags_in("input:not([disabled])"),
            vec![Term::from("input"), Term::from("input")]
        );
        assert_eq!(tags_in("[id^=pages]"), vec![Term::from("table")]);

        let enabled_ids = run(&ctx, None, |q| {
            with_scope(
                ScopeOverride::root("input:not([disabled])"),
                crate::attribute::attribute(Term::var(), "id", q),
            )
        })
        .unwrap();
        assert_eq!(enabled_ids, vec![Term::from("name_field"), Term::from("remember")]);
    }
}
