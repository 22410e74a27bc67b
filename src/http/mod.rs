//! HTTP facade subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → server.rs (Axum router, trace + timeout layers)
//!     → handlers.rs (extract path/query/body)
//!     → RegistryClient::ask (bounded by http.ask_timeout_ms)
//!     → registry reply → JSON response
//!     → response.rs (AskError → status code)
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, HttpServer};
