//! carelog analytics - Weekly analytics over caregiver logs
//!
//! Turns the meal, sleep, behavior, hydration and activity logs kept for a
//! child into a weekly report: a regulation battery score for the last 24
//! hours, open loops (unresolved requests), ABC trigger and intervention
//! frequencies, and sleep-related insights.
//!
//! ## Modules
//!
//! - **Components**: `regulation`, `open_loops`, `abc`, `insights`, `alerts`
//! - **Composition**: `summary` runs the components over one repository fetch
//! - **Surfaces**: `encoder` for client payloads, `ffi` for C hosts, and the
//!   `carelog` binary behind the `cli` feature
//!
//! Every operation takes `now` explicitly, so the same data and `now` always
//! produce the same report.

pub mod abc;
pub mod alerts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod insights;
pub mod open_loops;
pub mod regulation;
pub mod repository;
pub mod summary;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::AnalyticsConfig;
pub use error::AnalyticsError;
pub use repository::{InMemoryRepository, LogDataset, LogRepository};
pub use summary::{weekly_summary_json, AnalyticsEngine};
pub use window::TimeWindow;

/// Engine version embedded in all summary payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for summary payloads
pub const PRODUCER_NAME: &str = "carelog-analytics";
