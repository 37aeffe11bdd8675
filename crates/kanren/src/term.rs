use domlogic_core::{ElementHandle, Location, Size};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_VAR: AtomicU64 = AtomicU64::new(0);

/// A logic variable. Only identity matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u64);

impl Var {
    pub fn fresh() -> Self {
        Var(NEXT_VAR.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(Var),
    /// Placeholder for a variable left unbound in a reified answer.
    Reified(usize),
    Str(Arc<str>),
    Int(i64),
    Bool(bool),
    Element(ElementHandle),
    /// Named fields, compared positionally.
    Record(Vec<(Arc<str>, Term)>),
    List(Vec<Term>),
}

impl Term {
    pub fn var() -> Self {
        Term::Var(Var::fresh())
    }

    pub fn record<K: Into<Arc<str>>>(fields: impl IntoIterator<Item = (K, Term)>) -> Self {
        Term::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// `{width, height}`; either side may be a variable.
    pub fn size(width: impl Into<Term>, height: impl Into<Term>) -> Self {
        Term::record([("width", width.into()), ("height", height.into())])
    }

    /// `{x, y}`; either side may be a variable.
    pub fn location(x: impl Into<Term>, y: impl Into<Term>) -> Self {
        Term::record([("x", x.into()), ("y", y.into())])
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementHandle> {
        match self {
            Term::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Term> {
        match self {
            Term::Record(fields) => fields.iter().find(|(k, _)| &**k == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Str(s.into())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Str(s.into())
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Int(i)
    }
}

impl From<i32> for Term {
    fn from(i: i32) -> Self {
        Term::Int(i64::from(i))
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

impl From<ElementHandle> for Term {
    fn from(e: ElementHandle) -> Self {
        Term::Element(e)
    }
}

impl From<&ElementHandle> for Term {
    fn from(e: &ElementHandle) -> Self {
        Term::Element(e.clone())
    }
}

impl From<Size> for Term {
    fn from(s: Size) -> Self {
        Term::size(s.width, s.height)
    }
}

impl From<Location> for Term {
    fn from(l: Location) -> Self {
        Term::location(l.x, l.y)
    }
}

impl From<Vec<Term>> for Term {
    fn from(items: Vec<Term>) -> Self {
        Term::List(items)
    }
}

impl From<&Term> for Term {
    fn from(t: &Term) -> Self {
        t.clone()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(Var(n)) => write!(f, "_.v{}", n),
            Term::Reified(n) => write!(f, "_{}", n),
            Term::Str(s) => write!(f, "{:?}", s),
            Term::Int(i) => write!(f, "{}", i),
            Term::Bool(b) => write!(f, "{}", b),
            Term::Element(e) => write!(f, "{}", e),
            Term::Record(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Term::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vars_are_distinct() {
        assert_ne!(Var::fresh(), Var::fresh());
    }

    #[test]
    fn test_size_record() {
        let t = Term::from(Size::new(567, 105));
        assert_eq!(t, Term::size(567, 105));
        assert_eq!(t.field("height"), Some(&Term::Int(105)));
        assert_eq!(t.to_string(), "{width: 567, height: 105}");
    }

    #[test]
    fn test_display_strings_quoted() {
        assert_eq!(Term::from("Ministache").to_string(), "\"Ministache\"");
        assert_eq!(Term::List(vec![1.into(), "a".into()]).to_string(), "(1 \"a\")");
    }
}
