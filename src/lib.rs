//! Device registry library.
//!
//! A hierarchy of independent entities: one registry owns groups, each group
//! owns devices, and per-request aggregation sessions gather a reading from
//! every device of a group under a deadline.

pub mod actor;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;

pub use config::RegistryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::{Registry, RegistryClient};
