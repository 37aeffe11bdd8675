use std::rc::Rc;

use domlogic_core::Result;

use crate::substitution::Substitution;
use crate::term::{Term, Var};

/// Lazy, pull-based sequence of successor substitutions.
///
/// An `Err` item is a hard failure: drivers stop at the first one.
pub type Stream = Box<dyn Iterator<Item = Result<Substitution>>>;

/// A goal applied against an environment `C`.
pub struct Goal<C> {
    run: Rc<dyn Fn(&C, Substitution) -> Stream>,
}

impl<C> Clone for Goal<C> {
    fn clone(&self) -> Self {
        Self {
            run: self.run.clone(),
        }
    }
}

impl<C: Clone + 'static> Goal<C> {
    pub fn new(f: impl Fn(&C, Substitution) -> Stream + 'static) -> Self {
        Self { run: Rc::new(f) }
    }

    pub fn apply(&self, ctx: &C, s: Substitution) -> Stream {
        (self.run)(ctx, s)
    }
}

pub fn unit(s: Substitution) -> Stream {
    Box::new(std::iter::once(Ok(s)))
}

pub fn mzero() -> Stream {
    Box::new(std::iter::empty())
}

/// Defers building a stream until its first element is pulled.
pub fn lazy(f: impl FnOnce() -> Stream + 'static) -> Stream {
    Box::new(std::iter::once_with(f).flatten())
}

pub fn succeed<C: Clone + 'static>() -> Goal<C> {
    Goal::new(|_: &C, s: Substitution| unit(s))
}

pub fn fail<C: Clone + 'static>() -> Goal<C> {
    Goal::new(|_: &C, _: Substitution| mzero())
}

pub fn eq<C: Clone + 'static>(u: impl Into<Term>, v: impl Into<Term>) -> Goal<C> {
    let u = u.into();
    let v = v.into();
    Goal::new(move |_: &C, s: Substitution| match s.unify(&u, &v) {
        Some(s) => unit(s),
        None => mzero(),
    })
}

pub fn conj<C: Clone + 'static>(g1: Goal<C>, g2: Goal<C>) -> Goal<C> {
    Goal::new(move |ctx: &C, s: Substitution| {
        let g2 = g2.clone();
        let ctx = ctx.clone();
        let first = g1.apply(&ctx, s);
        Box::new(first.flat_map(move |item| -> Stream {
            match item {
                Ok(s) => g2.apply(&ctx, s),
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        }))
    })
}

/// Depth-first disjunction: every answer of `g1` precedes those of `g2`.
pub fn disj<C: Clone + 'static>(g1: Goal<C>, g2: Goal<C>) -> Goal<C> {
    Goal::new(move |ctx: &C, s: Substitution| {
        let g2 = g2.clone();
        let ctx2 = ctx.clone();
        let s2 = s.clone();
        Box::new(g1.apply(ctx, s).chain(lazy(move || g2.apply(&ctx2, s2))))
    })
}

pub fn conj_all<C: Clone + 'static>(goals: impl IntoIterator<Item = Goal<C>>) -> Goal<C> {
    let mut goals = goals.into_iter();
    match goals.next() {
        None => succeed(),
        Some(first) => goals.fold(first, conj),
    }
}

pub fn disj_all<C: Clone + 'static>(goals: impl IntoIterator<Item = Goal<C>>) -> Goal<C> {
    let goals: Vec<Goal<C>> = goals.into_iter().collect();
    match goals.len() {
        0 => fail(),
        _ => {
            let mut iter = goals.into_iter().rev();
            let last = iter.next().unwrap_or_else(fail);
            iter.fold(last, |acc, g| disj(g, acc))
        }
    }
}

/// Introduces a new variable each time the goal is applied.
pub fn fresh<C: Clone + 'static>(f: impl Fn(Term) -> Goal<C> + 'static) -> Goal<C> {
    Goal::new(move |ctx: &C, s: Substitution| f(Term::Var(Var::fresh())).apply(ctx, s))
}

pub fn fresh2<C: Clone + 'static>(f: impl Fn(Term, Term) -> Goal<C> + 'static) -> Goal<C> {
    Goal::new(move |ctx: &C, s: Substitution| f(Term::Var(Var::fresh()), Term::Var(Var::fresh())).apply(ctx, s))
}

/// Keeps only the first answer of `g`.
pub fn once<C: Clone + 'static>(g: Goal<C>) -> Goal<C> {
    Goal::new(move |ctx: &C, s: Substitution| Box::new(g.apply(ctx, s).take(1)))
}

/// Succeeds once for each value in `values` that unifies with `term`, in order.
pub fn member_of<C: Clone + 'static>(term: impl Into<Term>, values: Vec<Term>) -> Goal<C> {
    let term = term.into();
    let values = Rc::new(values);
    Goal::new(move |_: &C, s: Substitution| {
        let term = term.clone();
        let values = values.clone();
        Box::new(
            (0..values.len()).filter_map(move |i| s.unify(&term, &values[i]).map(Ok)),
        )
    })
}

/// Applies `goal` to the empty substitution.
pub fn solve<C: Clone + 'static>(ctx: &C, goal: &Goal<C>) -> Stream {
    goal.apply(ctx, Substitution::empty())
}

/// Pulls at most `n` answers (all of them for `None`) and reifies the query
/// variable in each. The first hard failure aborts the run.
pub fn run<C: Clone + 'static>(
    ctx: &C,
    n: Option<usize>,
    f: impl FnOnce(Term) -> Goal<C>,
) -> Result<Vec<Term>> {
    let q = Term::Var(Var::fresh());
    let goal = f(q.clone());
    let limit = n.unwrap_or(usize::MAX);
    let mut answers = Vec::new();
    for item in solve(ctx, &goal).take(limit) {
        let s = item?;
        answers.push(s.reify(&q));
    }
    Ok(answers)
}
