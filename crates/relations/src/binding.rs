use domlogic_kanren::{Substitution, Term};

/// Whether a relation argument is known yet.
///
/// Computed on every application from the current substitution; never cached.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Grounded(Term),
    Fresh,
}

impl Binding {
    pub fn of(s: &Substitution, term: &Term) -> Self {
        match s.walk(term) {
            Term::Var(_) => Binding::Fresh,
            value => Binding::Grounded(value),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Binding::Fresh)
    }
}
