use uuid::Uuid;

use super::todo::TodoId;

/// Hands out identifiers for new todos.
pub trait IdSource: Send + Sync + 'static {
    fn next_id(&self) -> TodoId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&self) -> TodoId { TodoId::from(Uuid::new_v4()) }
}

/// Always the same id, for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedIds(pub TodoId);

impl FixedIds {
    pub fn new(id: impl Into<String>) -> Self { Self(TodoId(id.into())) }
}

impl IdSource for FixedIds {
    fn next_id(&self) -> TodoId { self.0.clone() }
}
