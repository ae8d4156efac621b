//! Client-side todo cache kept in sync with the REST backend.
//!
//! # Design
//! `TodoStore` is constructed explicitly and owned by whoever drives the UI;
//! there is no global instance. Local state changes only after the server
//! confirms an action, except that a fan-out delete keeps whatever deletes
//! succeeded even when others fail.
//!
//! State sits behind a `parking_lot::RwLock` that is only taken for
//! synchronous reads and writes, never across an `.await`. Actions therefore
//! take `&self` and may overlap. Two overlapping updates of the same id are
//! not sequenced: the response that arrives last wins. `loading` stays true
//! until the last overlapping fetch or create has settled.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use parking_lot::RwLock;

use crate::api::TodoApi;
use crate::bulk::{apply_bulk_update, delete_each};
use crate::error::{ApiError, BulkDeleteError};
use crate::filter::filter_todos;
use crate::transport::Transport;
use crate::types::{CreateTodo, Priority, Todo, TodoFilters, TodoId, UpdateTodo};

/// Snapshot of everything the store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    /// Server order (newest first); never re-sorted locally.
    pub todos: Vec<Todo>,
    /// True while at least one fetch or create is in flight.
    pub loading: bool,
    /// Last failure, as a message fit for display.
    pub error: Option<String>,
    /// Applied on every fetch until replaced.
    pub filters: TodoFilters,
}

/// Todos grouped by priority, each group in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodosByPriority {
    pub high: Vec<Todo>,
    pub medium: Vec<Todo>,
    pub low: Vec<Todo>,
}

pub struct TodoStore<T> {
    api: TodoApi<T>,
    state: RwLock<StoreState>,
    /// Fetches and creates in flight. Only changed under the state write lock.
    loads: AtomicUsize,
}

impl<T: Transport> TodoStore<T> {
    /// Empty store; call [`TodoStore::fetch`] to populate it.
    pub fn new(api: TodoApi<T>) -> Self {
        Self {
            api,
            state: RwLock::new(StoreState::default()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn api(&self) -> &TodoApi<T> {
        &self.api
    }

    /// Replace the cached todos with the server's list.
    ///
    /// `filters`, when given, replaces the stored filters first. Failures are
    /// recorded in [`StoreState::error`] and otherwise swallowed; the cached
    /// todos are left as they were.
    pub async fn fetch(&self, filters: Option<TodoFilters>) {
        let filters = {
            let mut state = self.state.write();
            self.start_loading(&mut state);
            state.error = None;
            if let Some(filters) = filters {
                state.filters = filters;
            }
            state.filters
        };

        let result = self.api.list(&filters).await;

        let mut state = self.state.write();
        self.finish_loading(&mut state);
        match result {
            Ok(todos) => state.todos = todos,
            Err(err) => {
                tracing::error!(error = %err, "error fetching todos");
                state.error = Some(format!("Failed to fetch todos: {err}"));
            }
        }
    }

    /// Create a todo and put it at the front of the list.
    pub async fn create(&self, data: &CreateTodo) -> Result<Todo, ApiError> {
        self.begin(true);
        let result = self.api.create(data).await;

        let mut state = self.state.write();
        self.finish_loading(&mut state);
        match result {
            Ok(todo) => {
                state.todos.insert(0, todo.clone());
                Ok(todo)
            }
            Err(err) => Err(fail(&mut state, "create todo", err)),
        }
    }

    /// Update a todo and replace the cached copy in place.
    ///
    /// A todo that is not cached is not inserted, even though the server
    /// accepted the update; the server's copy is still returned.
    pub async fn update(&self, id: TodoId, patch: &UpdateTodo) -> Result<Todo, ApiError> {
        self.begin(false);
        let result = self.api.update(id, patch).await;

        let mut state = self.state.write();
        match result {
            Ok(todo) => {
                if let Some(slot) = state.todos.iter_mut().find(|t| t.id == id) {
                    *slot = todo.clone();
                }
                Ok(todo)
            }
            Err(err) => Err(fail(&mut state, "update todo", err)),
        }
    }

    /// Flip `completed` on a cached todo. Unknown ids are a no-op returning
    /// `Ok(None)` without a request.
    pub async fn toggle_completion(&self, id: TodoId) -> Result<Option<Todo>, ApiError> {
        let current = self
            .state
            .read()
            .todos
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.completed);

        match current {
            Some(completed) => self.update(id, &UpdateTodo::completed(!completed)).await.map(Some),
            None => Ok(None),
        }
    }

    /// Delete a todo; it leaves the cache only once the server confirms.
    pub async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
        self.begin(false);
        let result = self.api.delete(id).await;

        let mut state = self.state.write();
        match result {
            Ok(()) => {
                state.todos.retain(|t| t.id != id);
                Ok(())
            }
            Err(err) => Err(fail(&mut state, "delete todo", err)),
        }
    }

    /// Apply one patch to many todos with a single request. An empty id set
    /// does nothing.
    pub async fn bulk_update(&self, ids: &[TodoId], patch: &UpdateTodo) -> Result<(), ApiError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.begin(false);
        let result = self.api.bulk_update(ids, patch).await;

        let mut state = self.state.write();
        match result {
            Ok(()) => {
                let touched = apply_bulk_update(&mut state.todos, ids, patch, Utc::now());
                tracing::debug!(requested = ids.len(), touched, "applied bulk update locally");
                Ok(())
            }
            Err(err) => Err(fail(&mut state, "bulk update todos", err)),
        }
    }

    /// Mark every pending todo completed. No request when nothing is pending.
    pub async fn mark_all_completed(&self) -> Result<(), ApiError> {
        let pending: Vec<TodoId> = self
            .state
            .read()
            .todos
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.id)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }
        self.bulk_update(&pending, &UpdateTodo::completed(true)).await
    }

    /// Delete every completed todo, one concurrent request each.
    pub async fn clear_completed(&self) -> Result<Vec<TodoId>, BulkDeleteError> {
        let completed: Vec<TodoId> = self
            .state
            .read()
            .todos
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id)
            .collect();

        self.delete_many(&completed, "clear completed todos").await
    }

    /// Delete the given todos, one concurrent request each.
    ///
    /// Every delete runs to completion. Those that succeed are removed from
    /// the cache and are not rolled back if others fail; the error lists the
    /// ids that could not be deleted.
    pub async fn bulk_delete(&self, ids: &[TodoId]) -> Result<Vec<TodoId>, BulkDeleteError> {
        self.delete_many(ids, "delete todos").await
    }

    pub fn set_filters(&self, filters: TodoFilters) {
        self.state.write().filters = filters;
    }

    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.state.read().todos.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn filters(&self) -> TodoFilters {
        self.state.read().filters
    }

    /// Cached todos narrowed by the stored filters.
    pub fn filtered_todos(&self) -> Vec<Todo> {
        let state = self.state.read();
        filter_todos(&state.todos, &state.filters)
    }

    pub fn completed_count(&self) -> usize {
        self.state.read().todos.iter().filter(|t| t.completed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.state.read().todos.iter().filter(|t| !t.completed).count()
    }

    pub fn total_count(&self) -> usize {
        self.state.read().todos.len()
    }

    pub fn todos_by_priority(&self) -> TodosByPriority {
        let state = self.state.read();
        let group = |priority: Priority| -> Vec<Todo> {
            state
                .todos
                .iter()
                .filter(|t| t.priority == priority)
                .cloned()
                .collect()
        };
        TodosByPriority {
            high: group(Priority::High),
            medium: group(Priority::Medium),
            low: group(Priority::Low),
        }
    }

    fn begin(&self, loading: bool) {
        let mut state = self.state.write();
        state.error = None;
        if loading {
            self.start_loading(&mut state);
        }
    }

    fn start_loading(&self, state: &mut StoreState) {
        self.loads.fetch_add(1, Ordering::SeqCst);
        state.loading = true;
    }

    fn finish_loading(&self, state: &mut StoreState) {
        let remaining = self.loads.fetch_sub(1, Ordering::SeqCst) - 1;
        state.loading = remaining > 0;
    }

    async fn delete_many(&self, ids: &[TodoId], action: &str) -> Result<Vec<TodoId>, BulkDeleteError> {
        // Collapse repeats so one id never races against itself.
        let mut seen = HashSet::new();
        let ids: Vec<TodoId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        self.begin(false);
        let outcome = delete_each(&ids, |id| self.delete(id)).await;
        if outcome.is_complete() {
            tracing::debug!(deleted = outcome.deleted.len(), "{action} finished");
        }
        let result = outcome.into_result();

        if let Err(err) = &result {
            tracing::error!(failed = ?err.failed, error = %err, "error during {action}");
            self.state.write().error = Some(format!("Failed to {action}: {err}"));
        }
        result
    }
}

/// Record a failed action and hand the error back to the caller.
fn fail(state: &mut StoreState, action: &str, err: ApiError) -> ApiError {
    tracing::error!(error = %err, "error during {action}");
    state.error = Some(format!("Failed to {action}: {err}"));
    err
}
