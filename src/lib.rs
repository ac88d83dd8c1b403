//! Training-load dashboard backend.
//!
//! Loads per-athlete GPS / heart-rate session exports and post-session
//! questionnaires, joins them to the squad roster, and serves chart-ready
//! aggregates for a time window and population selection.

pub mod config;
pub mod controls;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod snapshot;

pub use config::DashboardConfig;
pub use controls::{HeartRateZone, Population, SpeedZone, TimeFrame};
pub use dashboard::{Dashboard, DashboardReport, Selection};
pub use error::{PipelineError, PipelineResult};
pub use snapshot::Snapshot;
