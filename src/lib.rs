//! goodhours - Good-weather windows from hourly forecasts
//!
//! goodhours turns an hourly forecast into the spans of time during which every
//! hour satisfies a user's comfort policy, through a deterministic pipeline:
//! payload adaptation → predicate evaluation → window extraction → work-hours
//! split → reconciliation with previously annotated windows.
//!
//! ## Modules
//!
//! - **Windows**: extract, split and reconcile good-weather windows
//! - **Days**: classify whole days as good for quick scanning

pub mod adapters;
pub mod config;
pub mod daily;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod predicate;
pub mod reconciler;
pub mod splitter;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::Settings;
pub use error::ForecastError;
pub use extractor::WindowExtractor;
pub use pipeline::{classify_payload, compute_windows, WindowProcessor};
pub use predicate::PredicateEvaluator;
pub use reconciler::WindowReconciler;
pub use splitter::WindowSplitter;
pub use store::WindowStore;
pub use types::{
    ComfortPolicy, DailyForecast, DailySample, HourlySample, Window, WindowId, WorkHours,
};

/// goodhours version
pub const GOODHOURS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI
pub const PRODUCER_NAME: &str = "goodhours";
