use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Observation stamped on a task whose progress did not move since the most
/// recent prior report of the same title.
pub const OBSERVACION_SIN_PROGRESO: &str =
    "No se progresó en la tarea desde el último check-in";

/// Directory entry for one employee. Owned externally; read-only here apart
/// from the seeding helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    /// Display name for outbound mail: name, else email, else a generic label.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        let email = self.email.trim();
        if !email.is_empty() {
            return email.to_string();
        }
        format!("Empleado {}", self.id)
    }
}

/// One employee's daily status record, keyed by `(date, employee_id)`. The row
/// id is the mail correlation key (thread id, else first message id).
#[derive(Debug, Clone)]
pub struct Checkin {
    pub id: String,
    pub date: NaiveDate,
    pub employee_id: String,
    pub thread_id: Option<String>,
    pub first_message_id: Option<String>,
    pub reply_received_at: Option<DateTime<Utc>>,
}

/// Task status domain. Anything outside it normalizes to `EnProgreso`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pendiente,
    EnProgreso,
    Completado,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pendiente => "pendiente",
            TaskStatus::EnProgreso => "en_progreso",
            TaskStatus::Completado => "completado",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pendiente" => Some(TaskStatus::Pendiente),
            "en_progreso" => Some(TaskStatus::EnProgreso),
            "completado" => Some(TaskStatus::Completado),
            _ => None,
        }
    }
}

/// Untrusted task candidate as the extractor produced it. `progress` stays a
/// raw JSON value so that only a structural integer is ever trusted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    #[serde(default)]
    pub next_steps: Option<String>,
    #[serde(default)]
    pub blocker: Option<String>,
}

/// Task after validation/clamping, ready for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTask {
    pub title: String,
    pub status: TaskStatus,
    pub progress: Option<i64>,
    pub next_steps: Option<String>,
    pub blocker: Option<String>,
}

/// Task row as stored, with the derived stagnation observation.
#[derive(Debug, Clone)]
pub struct PersistedTask {
    pub id: i64,
    pub checkin_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub progress: Option<i64>,
    pub next_steps: Option<String>,
    pub blocker: Option<String>,
    pub observation: String,
}

/// Validated extractor output for one reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedReply {
    #[serde(default)]
    pub employee: Option<String>,
    pub for_date: NaiveDate,
    pub tasks: Vec<RawTask>,
}

/// Row of the pending-task listing rendered into the daily email.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTask {
    pub title: String,
    pub status: Option<String>,
    pub progress: Option<i64>,
    pub next_steps: Option<String>,
    pub blocker: Option<String>,
}

/// Open task joined with its employee name, for the management digest.
#[derive(Debug, Clone, Serialize)]
pub struct OpenTask {
    pub employee_name: String,
    pub title: String,
    pub status: Option<String>,
    pub progress: Option<i64>,
    pub next_steps: Option<String>,
    pub blocker: Option<String>,
}

/// Check-in still waiting for a reply, joined with its employee for the
/// reminder job.
#[derive(Debug, Clone)]
pub struct PendingCheckin {
    pub checkin_id: String,
    pub thread_id: Option<String>,
    pub date: NaiveDate,
    pub employee_name: String,
    pub employee_email: String,
}

/// Task+employee join row feeding the summary rebuild.
#[derive(Debug, Clone)]
pub struct SummarySource {
    pub employee_name: Option<String>,
    pub task_title: Option<String>,
    pub status: Option<String>,
    pub observation: Option<String>,
}

/// Last-known-state row of the denormalized summary table, unique on
/// `(employee_name, task_title)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub employee_name: String,
    pub task_title: String,
    pub status: String,
    pub observation: Option<String>,
}
