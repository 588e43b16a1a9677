use crate::{
    domain::{Todo, TodoList, TodoListQuery},
    error::ServiceError,
    repository::TodoRepository,
};
use std::sync::Arc;
use uuid::Uuid;

/// Application service between the HTTP handlers and the todo repository.
#[derive(Clone)]
pub struct TodoUsecase {
    repo: Arc<dyn TodoRepository>,
}

impl TodoUsecase {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, todo: Todo) -> Result<Todo, ServiceError> {
        self.repo.create(todo).await
    }

    pub async fn detail(&self, id: Uuid) -> Result<Todo, ServiceError> {
        self.repo.get_by_uuid(id).await
    }

    /// An empty page is a successful result, not `NotFound`.
    pub async fn get_list(&self, query: &TodoListQuery) -> Result<TodoList, ServiceError> {
        self.repo.get_list(query).await
    }
}
