//! Client-side synchronization for the todo service.
//!
//! # Overview
//! A typed client for the todo REST API plus `TodoStore`, a local cache that
//! mirrors server state. The store changes only after the server confirms an
//! action. Its filter and count views are derived on demand.
//!
//! # Design
//! - `TodoClient` is stateless and I/O-free: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `Transport` is the only place a request suspends; `ReqwestTransport` is
//!   the production implementation.
//! - `TodoApi` pairs the two into async operations; `TodoStore` drives
//!   `TodoApi` and reconciles its results into local state.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use api::TodoApi;
pub use bulk::{BulkUpdate, DeleteOutcome};
pub use client::TodoClient;
pub use config::Config;
pub use error::{ApiError, BulkDeleteError, ConfigError};
pub use filter::filter_todos;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{StoreState, TodoStore, TodosByPriority};
pub use transport::{ReqwestTransport, Transport};
pub use types::{validate_title, CreateTodo, Health, Priority, Todo, TodoFilters, TodoId, UpdateTodo};
