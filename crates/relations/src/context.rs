use domlogic_core::{Oracle, ScopeConfig, ScopeOverride};
use domlogic_kanren::Goal;
use std::rc::Rc;
use tracing::debug;

/// Everything a relation reads besides the substitution: the oracle session
/// and the scope selectors in effect for this call.
#[derive(Clone)]
pub struct QueryContext {
    oracle: Rc<dyn Oracle>,
    scope: ScopeConfig,
}

pub type Relation = Goal<QueryContext>;

impl QueryContext {
    pub fn new(oracle: Rc<dyn Oracle>) -> Self {
        Self::with_scope_config(oracle, ScopeConfig::default())
    }

    pub fn with_scope_config(oracle: Rc<dyn Oracle>, scope: ScopeConfig) -> Self {
        Self { oracle, scope }
    }

    pub fn oracle(&self) -> &dyn Oracle {
        self.oracle.as_ref()
    }

    pub fn scope(&self) -> &ScopeConfig {
        &self.scope
    }

    /// Same session, scopes replaced where `over` says so.
    pub fn with_scope(&self, over: &ScopeOverride) -> Self {
        Self {
            oracle: self.oracle.clone(),
            scope: self.scope.overridden(over),
        }
    }
}

/// Runs `goal` with scope selectors overridden for everything it enumerates.
///
/// The override lives in the context handed down the search, so backtracking
/// out of `goal` restores the outer scopes with no cleanup.
pub fn with_scope(over: ScopeOverride, goal: Relation) -> Relation {
    Goal::new(move |ctx: &QueryContext, s| {
        if over.is_empty() {
            return goal.apply(ctx, s);
        }
        let scoped = ctx.with_scope(&over);
        debug!(root = %scoped.scope().root, child = %scoped.scope().child, "Scope override");
        goal.apply(&scoped, s)
    })
}
