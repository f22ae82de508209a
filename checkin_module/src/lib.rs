//! Daily employee check-in engine.
//!
//! Sends a status-request email per active employee, ingests free-text
//! replies through an extraction prompt, reconciles the extracted tasks
//! against history (detecting stagnation), and maintains a denormalized
//! summary table for reporting. Runs as finite cron-style jobs.

pub mod config;
pub mod extractor;
pub mod jobs;
pub mod mailer;
pub mod normalize;
pub mod store;
pub mod templates;
pub mod types;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use config::ServiceConfig;
pub use store::{CheckinStore, StoreError};
pub use types::{
    Checkin, Employee, ExtractedReply, NormalizedTask, PersistedTask, RawTask, TaskStatus,
    OBSERVACION_SIN_PROGRESO,
};
