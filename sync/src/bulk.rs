//! Bulk operations over a set of todo ids.
//!
//! Bulk update is one server call whose patch the caller mirrors locally with
//! [`apply_bulk_update`]. There is no bulk-delete endpoint, so [`delete_each`]
//! fans out one delete per id, lets every request settle, and reports the
//! ids that failed. Deletes that succeeded stay deleted.

use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, BulkDeleteError};
use crate::types::{Todo, TodoId, UpdateTodo};

/// Body of `PUT /api/todos/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkUpdate {
    pub todo_ids: Vec<TodoId>,
    pub updates: UpdateTodo,
}

/// Apply `patch` to every todo whose id is in `ids` and stamp it with `now`.
/// The bulk endpoint returns no records, so the timestamp is a local
/// approximation. Returns how many todos were touched.
pub fn apply_bulk_update(todos: &mut [Todo], ids: &[TodoId], patch: &UpdateTodo, now: DateTime<Utc>) -> usize {
    let ids: HashSet<TodoId> = ids.iter().copied().collect();
    let mut touched = 0;
    for todo in todos.iter_mut().filter(|todo| ids.contains(&todo.id)) {
        patch.apply_to(todo);
        todo.updated_at = now;
        touched += 1;
    }
    touched
}

/// Per-id results of a fan-out delete, in the order the ids were given.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub deleted: Vec<TodoId>,
    pub failed: Vec<(TodoId, ApiError)>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Ok with the deleted ids, or the aggregate error carrying the first
    /// failure.
    pub fn into_result(self) -> Result<Vec<TodoId>, BulkDeleteError> {
        let mut failures = self.failed.into_iter();
        let Some((first_id, source)) = failures.next() else {
            return Ok(self.deleted);
        };
        let mut failed = vec![first_id];
        failed.extend(failures.map(|(id, _)| id));
        Err(BulkDeleteError {
            deleted: self.deleted,
            failed,
            source,
        })
    }
}

/// Run `delete` for every id concurrently and wait for all of them.
pub async fn delete_each<F, Fut>(ids: &[TodoId], delete: F) -> DeleteOutcome
where
    F: Fn(TodoId) -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    let results = join_all(ids.iter().map(|&id| delete(id))).await;

    let mut outcome = DeleteOutcome::default();
    for (&id, result) in ids.iter().zip(results) {
        match result {
            Ok(()) => outcome.deleted.push(id),
            Err(err) => outcome.failed.push((id, err)),
        }
    }
    outcome
}
