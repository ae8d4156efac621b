//! Async todo API: `TodoClient` request building paired with a `Transport`.

use futures::future::join_all;

use crate::client::TodoClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{CreateTodo, Health, Todo, TodoFilters, TodoId, UpdateTodo};

/// Stateless async client for the todo REST API. No retries, no caching.
#[derive(Debug, Clone)]
pub struct TodoApi<T> {
    client: TodoClient,
    transport: T,
}

impl TodoApi<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(TodoClient::new(config.api_base_url()), ReqwestTransport::new())
    }
}

impl<T: Transport> TodoApi<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn list(&self, filters: &TodoFilters) -> Result<Vec<Todo>, ApiError> {
        let request = self.client.build_list_todos(filters)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_list_todos(response)
    }

    pub async fn get(&self, id: TodoId) -> Result<Todo, ApiError> {
        let response = self.transport.execute(self.client.build_get_todo(id)).await?;
        self.client.parse_get_todo(response)
    }

    pub async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError> {
        let request = self.client.build_create_todo(input)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_create_todo(response)
    }

    pub async fn update(&self, id: TodoId, patch: &UpdateTodo) -> Result<Todo, ApiError> {
        let request = self.client.build_update_todo(id, patch)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_update_todo(response)
    }

    pub async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }

    pub async fn bulk_update(&self, ids: &[TodoId], patch: &UpdateTodo) -> Result<(), ApiError> {
        let request = self.client.build_bulk_update(ids, patch)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_bulk_update(response)
    }

    pub async fn health_check(&self) -> Result<Health, ApiError> {
        let response = self.transport.execute(self.client.build_health_check()).await?;
        self.client.parse_health_check(response)
    }

    /// Create each item in order, one request at a time. Stops at the first
    /// failure.
    pub async fn create_many(&self, items: &[CreateTodo]) -> Result<Vec<Todo>, ApiError> {
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            created.push(self.create(item).await?);
        }
        Ok(created)
    }

    /// Delete every todo on the server concurrently. All deletes run to
    /// completion; the first failure is reported afterwards.
    pub async fn delete_all(&self) -> Result<usize, ApiError> {
        let todos = self.list(&TodoFilters::default()).await?;
        let results = join_all(todos.iter().map(|todo| self.delete(todo.id))).await;
        let deleted = results.iter().filter(|result| result.is_ok()).count();
        match results.into_iter().find_map(Result::err) {
            Some(err) => Err(err),
            None => Ok(deleted),
        }
    }
}
