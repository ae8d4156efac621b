//! Filter predicate over in-memory todos.

use crate::types::{Todo, TodoFilters};

impl TodoFilters {
    pub fn is_empty(&self) -> bool {
        self.completed.is_none() && self.priority.is_none()
    }

    /// True when every field set on the filter matches `todo` exactly.
    pub fn matches(&self, todo: &Todo) -> bool {
        self.completed.map_or(true, |completed| todo.completed == completed)
            && self.priority.map_or(true, |priority| todo.priority == priority)
    }
}

/// Stable filter: keeps the relative order of `todos`.
pub fn filter_todos(todos: &[Todo], filters: &TodoFilters) -> Vec<Todo> {
    todos
        .iter()
        .filter(|todo| filters.matches(todo))
        .cloned()
        .collect()
}
