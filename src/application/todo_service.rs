use crate::domain::clock::{Clock, SystemClock};
use crate::domain::ids::{IdSource, UuidIds};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{due_instant, StoredTodo, Todo, TodoStatus};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid data")]
    InvalidData,
}

/// Serialized as `{"error": {"message": ..., "data": <todo>}}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rejection {
    pub error: RejectionDetail,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RejectionDetail {
    pub message: String,
    pub data: Todo,
}

impl Rejection {
    pub fn new(reason: ValidationError, data: Todo) -> Self {
        Self { error: RejectionDetail { message: reason.to_string(), data } }
    }
}

/// Result of a create call that reached a decision. Validation failures are
/// values; repository failures come back as `Err` from the call itself.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CreateOutcome {
    Created(StoredTodo),
    Rejected(Rejection),
}

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<StoredTodo>>;
    async fn create(&self, todo: Todo) -> Result<CreateOutcome>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository, C: Clock = SystemClock, G: IdSource = UuidIds> {
    repo: R,
    clock: C,
    ids: G,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo, clock: SystemClock, ids: UuidIds } }
}

impl<R: TodoRepository, C: Clock, G: IdSource> TodoServiceImpl<R, C, G> {
    pub fn with_sources(repo: R, clock: C, ids: G) -> Self { Self { repo, clock, ids } }
}

#[async_trait]
impl<R: TodoRepository, C: Clock, G: IdSource> TodoService for TodoServiceImpl<R, C, G> {
    async fn list(&self) -> Result<Vec<StoredTodo>> {
        let stored = self.repo.list().await?;
        tracing::debug!(count = stored.len(), "listed todos");
        Ok(stored.into_iter().map(StoredTodo::with_uppercase_text).collect())
    }

    async fn create(&self, mut todo: Todo) -> Result<CreateOutcome> {
        // The id goes on first: rejected todos are echoed back with it.
        todo.id = self.ids.next_id();

        let when = match todo.when {
            Some(when) if todo.is_valid() => when,
            _ => {
                tracing::warn!(id = %todo.id, "rejecting todo with invalid data");
                return Ok(CreateOutcome::Rejected(Rejection::new(ValidationError::InvalidData, todo)));
            }
        };

        let when = due_instant(when);
        let status = TodoStatus::at(when, self.clock.now());
        todo.when = Some(when);
        todo.status = Some(status);
        tracing::debug!(id = %todo.id, status = status.as_str(), "creating todo");

        let stored = self.repo.create(todo).await?;
        Ok(CreateOutcome::Created(stored))
    }
}
