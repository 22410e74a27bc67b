//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, groups, leaves and sessions produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with group / leaf / request_id fields
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
