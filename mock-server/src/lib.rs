use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

pub const MAX_TITLE_LEN: usize = 250;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    #[serde(default)]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Clone, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

impl UpdateTodo {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(description) = &self.description {
            todo.description = Some(description.clone());
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = Some(due_date);
        }
        touch(todo);
    }
}

#[derive(Deserialize)]
pub struct BulkUpdate {
    pub todo_ids: Option<Vec<u64>>,
    pub updates: Option<UpdateTodo>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub completed: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    todos: HashMap<u64, Todo>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error responses carry `{"error": "..."}` like the real backend.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Resource not found".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/bulk", put(bulk_update_todos))
        .route("/api/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Refresh `updated_at`, keeping it strictly increasing per record.
fn touch(todo: &mut Todo) {
    let now = Utc::now();
    todo.updated_at = if now > todo.updated_at {
        now
    } else {
        todo.updated_at + Duration::microseconds(1)
    };
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Todo App API",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "endpoints": {
            "health": "/api/health",
            "todos": "/api/todos",
        },
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_todos(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Todo>> {
    let completed = params.completed.as_deref().map(parse_flag);
    let store = db.read().await;
    let mut todos: Vec<Todo> = store
        .todos
        .values()
        .filter(|todo| completed.map_or(true, |c| todo.completed == c))
        .filter(|todo| params.priority.map_or(true, |p| todo.priority == p))
        .cloned()
        .collect();
    // Newest first; ids break ties between equal timestamps.
    todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Json(todos)
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let title = input.title.unwrap_or_default();
    validate_title(&title)?;

    let mut store = db.write().await;
    store.next_id += 1;
    let now = Utc::now();
    let todo = Todo {
        id: store.next_id,
        title,
        description: input.description,
        completed: false,
        priority: input.priority.unwrap_or_default(),
        due_date: input.due_date,
        created_at: now,
        updated_at: now,
    };
    store.todos.insert(todo.id, todo.clone());
    tracing::debug!(id = todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Todo>, AppError> {
    let store = db.read().await;
    store.todos.get(&id).cloned().map(Json).ok_or_else(AppError::not_found)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, AppError> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or_else(AppError::not_found)?;
    if input.is_empty() {
        return Err(AppError::bad_request("No data provided"));
    }
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    input.apply(todo);
    tracing::debug!(id, "updated todo");
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, AppError> {
    let mut store = db.write().await;
    store.todos.remove(&id).ok_or_else(AppError::not_found)?;
    tracing::debug!(id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_update_todos(
    State(db): State<Db>,
    Json(input): Json<BulkUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (Some(ids), Some(updates)) = (input.todo_ids, input.updates) else {
        return Err(AppError::bad_request("todo_ids and updates are required"));
    };
    if let Some(title) = &updates.title {
        validate_title(title)?;
    }

    let mut store = db.write().await;
    let mut updated = 0;
    for id in ids {
        if let Some(todo) = store.todos.get_mut(&id) {
            updates.apply(todo);
            updated += 1;
        }
    }
    tracing::debug!(updated, "bulk updated todos");
    Ok(Json(json!({
        "message": format!("Updated {updated} todos successfully"),
        "updated_count": updated,
    })))
}
