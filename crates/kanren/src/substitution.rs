use std::rc::Rc;

use crate::term::{Term, Var};

#[derive(Debug)]
struct Link {
    var: Var,
    term: Term,
    next: Option<Rc<Link>>,
}

impl Drop for Link {
    // Iterative: long unshared tails must not recurse.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(link) = next {
            match Rc::try_unwrap(link) {
                Ok(mut l) => next = l.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// Accumulated bindings of a search branch.
///
/// A persistent list, newest binding first: `extend` and `unify` push onto a
/// shared tail and leave the receiver untouched, so sibling branches share
/// their common prefix.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    head: Option<Rc<Link>>,
    len: usize,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn lookup(&self, x: &Var) -> Option<&Term> {
        let mut link = self.head.as_deref();
        while let Some(l) = link {
            if l.var == *x {
                return Some(&l.term);
            }
            link = l.next.as_deref();
        }
        None
    }

    /// Follows variable bindings until reaching a non-variable or an unbound variable.
    pub fn walk(&self, term: &Term) -> Term {
        let mut current = term;
        while let Term::Var(v) = current {
            match self.lookup(v) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.clone()
    }

    /// Walks recursively through records and lists.
    pub fn walk_star(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Record(fields) => Term::Record(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.walk_star(v)))
                    .collect(),
            ),
            Term::List(items) => Term::List(items.iter().map(|t| self.walk_star(t)).collect()),
            other => other,
        }
    }

    pub fn occurs(&self, x: &Var, term: &Term) -> bool {
        match self.walk(term) {
            Term::Var(v) => v == *x,
            Term::Record(fields) => fields.iter().any(|(_, v)| self.occurs(x, v)),
            Term::List(items) => items.iter().any(|t| self.occurs(x, t)),
            _ => false,
        }
    }

    /// Binds `x` to `term`, refusing circular bindings.
    pub fn extend(&self, x: Var, term: Term) -> Option<Self> {
        if self.occurs(&x, &term) {
            return None;
        }
        Some(Self {
            head: Some(Rc::new(Link {
                var: x,
                term,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        })
    }

    pub fn unify(&self, u: &Term, v: &Term) -> Option<Self> {
        let u = self.walk(u);
        let v = self.walk(v);
        match (&u, &v) {
            (Term::Var(a), Term::Var(b)) if a == b => Some(self.clone()),
            (Term::Var(a), _) => self.extend(*a, v),
            (_, Term::Var(b)) => self.extend(*b, u),
            (Term::Record(a), Term::Record(b)) => {
                if a.len() != b.len() {
                    return None;
                }
                let mut s = self.clone();
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    if ka != kb {
                        return None;
                    }
                    s = s.unify(va, vb)?;
                }
                Some(s)
            }
            (Term::List(a), Term::List(b)) => {
                if a.len() != b.len() {
                    return None;
                }
                let mut s = self.clone();
                for (x, y) in a.iter().zip(b.iter()) {
                    s = s.unify(x, y)?;
                }
                Some(s)
            }
            _ if u == v => Some(self.clone()),
            _ => None,
        }
    }

    /// Whether `term` walks to a non-variable value.
    pub fn is_grounded(&self, term: &Term) -> bool {
        !self.walk(term).is_var()
    }

    /// Fully walks `term` and names each remaining variable `_0`, `_1`, ...
    pub fn reify(&self, term: &Term) -> Term {
        let walked = self.walk_star(term);
        let names = Substitution::empty().reify_names(&walked);
        names.walk_star(&walked)
    }

    fn reify_names(self, term: &Term) -> Self {
        match self.walk(term) {
            Term::Var(v) => {
                let n = self.len();
                self.extend(v, Term::Reified(n)).unwrap_or(self)
            }
            Term::Record(fields) => fields
                .iter()
                .fold(self, |s, (_, t)| s.reify_names(t)),
            Term::List(items) => items.iter().fold(self, |s, t| s.reify_names(t)),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_chains() {
        let x = Var::fresh();
        let y = Var::fresh();
        let z = Var::fresh();
        let s = Substitution::empty()
            .extend(z, "a".into())
            .unwrap()
            .extend(y, Term::Var(z))
            .unwrap();
        assert_eq!(s.walk(&Term::Var(y)), Term::from("a"));
        assert_eq!(s.walk(&Term::Var(x)), Term::Var(x));
        assert!(s.is_grounded(&Term::Var(y)));
        assert!(!s.is_grounded(&Term::Var(x)));
    }

    #[test]
    fn test_unify_records_by_field() {
        let w = Var::fresh();
        let s = Substitution::empty()
            .unify(&Term::size(Term::Var(w), 105), &Term::size(567, 105))
            .unwrap();
        assert_eq!(s.walk(&Term::Var(w)), Term::Int(567));

        assert!(Substitution::empty()
            .unify(&Term::size(567, 105), &Term::size(567, 106))
            .is_none());
        assert!(Substitution::empty()
            .unify(&Term::size(1, 2), &Term::location(1, 2))
            .is_none());
    }

    #[test]
    fn test_occurs_check() {
        let x = Var::fresh();
        let list = Term::List(vec![Term::Var(x)]);
        assert!(Substitution::empty().unify(&Term::Var(x), &list).is_none());
    }

    #[test]
    fn test_extend_leaves_parent_untouched() {
        let x = Var::fresh();
        let parent = Substitution::empty();
        let child = parent.extend(x, 1.into()).unwrap();
        assert!(parent.is_empty());
        assert_eq!(child.len(), 1);
    }

    #[test]
    fn test_reify_names_unbound() {
        let x = Var::fresh();
        let y = Var::fresh();
        let q = Var::fresh();
        let s = Substitution::empty()
            .extend(q, Term::List(vec![Term::Var(x), "corn".into(), Term::Var(y), Term::Var(x)]))
            .unwrap();
        assert_eq!(
            s.reify(&Term::Var(q)),
            Term::List(vec![
                Term::Reified(0),
                "corn".into(),
                Term::Reified(1),
                Term::Reified(0)
            ])
        );
    }

    #[test]
    fn test_siblings_share_parent_bindings() {
        let x = Var::fresh();
        let y = Var::fresh();
        let parent = Substitution::empty().extend(x, "shared".into()).unwrap();
        let left = parent.extend(y, 1.into()).unwrap();
        let right = parent.unify(&Term::Var(y), &2.into()).unwrap();
        assert_eq!(left.walk(&Term::Var(y)), Term::Int(1));
        assert_eq!(right.walk(&Term::Var(y)), Term::Int(2));
        assert_eq!(left.walk(&Term::Var(x)), right.walk(&Term::Var(x)));
        assert_eq!((parent.len(), left.len(), right.len()), (1, 2, 2));
        assert!(Rc::ptr_eq(
            left.head.as_ref().and_then(|l| l.next.as_ref()).unwrap(),
            parent.head.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_long_chain_walks_to_value() {
        let vars: Vec<Var> = (0..500).map(|_| Var::fresh()).collect();
        let mut s = Substitution::empty().extend(vars[0], "end".into()).unwrap();
        for pair in vars.windows(2) {
            s = s.extend(pair[1], Term::Var(pair[0])).unwrap();
        }
        assert_eq!(s.len(), 500);
        assert_eq!(s.walk(&Term::Var(vars[499])), Term::from("end"));
    }
}
