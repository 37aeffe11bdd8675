//! Relations between logic variables and facts of a live document.
//!
//! Each relation is a goal for the `domlogic-kanren` solver. Applied to a
//! substitution it looks at which arguments are already grounded, asks the
//! oracle only what it needs, and yields successor substitutions lazily so a
//! caller asking for the first answer pays for one answer's worth of oracle
//! traffic.
//!
//! ```ignore
//! let ctx = QueryContext::new(Rc::new(oracle));
//! let tables = run(&ctx, None, |q| attribute(q, "id", "pages-table"))?;
//! ```

pub mod attribute;
pub mod binding;
pub mod content;
pub mod context;
pub mod fault;
pub mod geometry;
pub mod page;
pub mod predicate;
pub mod property;
pub mod structure;
pub mod verify;
pub mod vocabulary;

pub use attribute::attribute;
pub use binding::Binding;
pub use content::{tag, text};
pub use context::{with_scope, QueryContext, Relation};
pub use geometry::{location, size};
pub use page::{current_url, title};
pub use predicate::{displayed, enabled, exists, present, selected, visible};
pub use structure::child_of;
pub use vocabulary::{known_attribute, known_tag, KNOWN_ATTRIBUTES, KNOWN_TAGS};

#[cfg(test)]
pub(crate) mod fixture;
