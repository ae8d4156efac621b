//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Titles are validated in `build_*`, so an invalid payload never reaches the
//! network.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bulk::BulkUpdate;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{validate_title, CreateTodo, Health, Todo, TodoFilters, TodoId, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_todos(&self, filters: &TodoFilters) -> Result<HttpRequest, ApiError> {
        let query = serde_urlencoded::to_string(filters).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let path = if query.is_empty() {
            format!("{}/api/todos", self.base_url)
        } else {
            format!("{}/api/todos?{query}", self.base_url)
        };
        Ok(bodyless(HttpMethod::Get, path))
    }

    pub fn build_get_todo(&self, id: TodoId) -> HttpRequest {
        bodyless(HttpMethod::Get, format!("{}/api/todos/{id}", self.base_url))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        validate_title(&input.title)?;
        json_request(HttpMethod::Post, format!("{}/api/todos", self.base_url), input)
    }

    pub fn build_update_todo(&self, id: TodoId, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        if let Some(title) = &input.title {
            validate_title(title)?;
        }
        json_request(HttpMethod::Put, format!("{}/api/todos/{id}", self.base_url), input)
    }

    pub fn build_delete_todo(&self, id: TodoId) -> HttpRequest {
        bodyless(HttpMethod::Delete, format!("{}/api/todos/{id}", self.base_url))
    }

    pub fn build_bulk_update(&self, ids: &[TodoId], updates: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::Validation("todo_ids must not be empty".to_string()));
        }
        if let Some(title) = &updates.title {
            validate_title(title)?;
        }
        let body = BulkUpdate {
            todo_ids: ids.to_vec(),
            updates: updates.clone(),
        };
        json_request(HttpMethod::Put, format!("{}/api/todos/bulk", self.base_url), &body)
    }

    pub fn build_health_check(&self) -> HttpRequest {
        bodyless(HttpMethod::Get, format!("{}/api/health", self.base_url))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    /// Backends differ on 200-with-message versus 204, so any 2xx is success.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)
    }

    /// The bulk endpoint returns no per-record bodies; the payload is ignored.
    pub fn parse_bulk_update(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)
    }

    pub fn parse_health_check(&self, response: HttpResponse) -> Result<Health, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }
}

fn bodyless(method: HttpMethod, path: String) -> HttpRequest {
    HttpRequest {
        method,
        path,
        headers: Vec::new(),
        body: None,
    }
}

fn json_request<T: Serialize>(method: HttpMethod, path: String, input: &T) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(status_error(response))
}

fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(status_error(response))
}

fn status_error(response: &HttpResponse) -> ApiError {
    match response.status {
        404 => ApiError::NotFound,
        400 => ApiError::Validation(error_message(&response.body)),
        status @ 500..=599 => ApiError::ServerError { status },
        status => ApiError::HttpError {
            status,
            body: response.body.clone(),
        },
    }
}

/// Pull the human-readable message out of an `{"error": "..."}` body. Any
/// other body (proxy pages, plain text) is not shown to users.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| "request rejected by server".to_string())
}
