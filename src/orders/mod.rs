pub mod context;

pub use context::{ChangeCounts, ContextError, EntityState, OrdersContext};

/// A customer row as seen by the change tracker.
///
/// `id` is `None` until the row has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Option<i64>,
    pub name: String,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}
