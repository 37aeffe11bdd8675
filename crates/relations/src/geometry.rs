//! `size(elem, {width, height})` and `location(elem, {x, y})`, in CSS pixels.
//!
//! The value side is a record, so a pattern such as `Term::size(w, 105)`
//! matches on height alone and binds `w`.

use crate::context::Relation;
use crate::property::element_property;
use domlogic_kanren::Term;

pub fn size(elem: impl Into<Term>, value: impl Into<Term>) -> Relation {
    element_property(elem, value, |oracle, el| oracle.size(el).map(|s| Some(Term::from(s))))
}

pub fn location(elem: impl Into<Term>, value: impl Into<Term>) -> Relation {
    element_property(elem, value, |oracle, el| {
        oracle.location(el).map(|l| Some(Term::from(l)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_document;
    use domlogic_kanren::{fresh, run};

    #[test]
    fn test_location_of_table() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let at = run(&ctx, None, |q| location(table.clone(), q)).unwrap();
        assert_eq!(at, vec![Term::location(37, 295)]);
        assert!(run(&ctx, None, |_| location(table, Term::location(0, 0))).unwrap().is_empty());
    }

    #[test]
    fn test_size_of_table() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let dims = run(&ctx, None, |q| size(table.clone(), q)).unwrap();
        assert_eq!(dims, vec![Term::size(567, 105)]);
        assert_eq!(dims[0].to_string(), "{width: 567, height: 105}");
        assert!(run(&ctx, None, |_| size(table, Term::size(567, 106))).unwrap().is_empty());
    }

    #[test]
    fn test_partial_record_binds_missing_field() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        let widths = run(&ctx, None, |w| size(table, Term::size(w, 105))).unwrap();
        assert_eq!(widths, vec![Term::Int(567)]);
    }

    #[test]
    fn test_find_element_by_location() {
        let (doc, ctx) = sample_document();
        let found = run(&ctx, None, |q| {
            fresh(move |y| location(q.clone(), Term::location(37, y)))
        })
        .unwrap();
        assert_eq!(found, vec![Term::from(doc.by_id("pages-table").unwrap())]);
    }

    #[test]
    fn test_mismatched_shape_fails() {
        let (doc, ctx) = sample_document();
        let table = doc.by_id("pages-table").unwrap();
        assert!(run(&ctx, None, |_| size(table, Term::location(567, 105))).unwrap().is_empty());
    }
}
