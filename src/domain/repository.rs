use async_trait::async_trait;
use super::todo::{StoredTodo, Todo};

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<StoredTodo>>;
    /// Persists `todo` as given and returns it with any store-owned metadata.
    async fn create(&self, todo: Todo) -> anyhow::Result<StoredTodo>;
}
