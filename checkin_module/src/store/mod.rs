use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

mod checkins;
mod employees;
mod schema;
mod summary;
mod tasks;

pub use summary::{build_summary_rows, SUMMARY_CHUNK_SIZE};

use schema::CHECKIN_SCHEMA;

/// SQLite-backed store for the check-in engine. A connection is opened per
/// call; constructed explicitly and passed to every job (no global handle).
#[derive(Debug)]
pub struct CheckinStore {
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a thread_id (or first_message_id) is required to build the check-in id")]
    InvalidIdentity,
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("datetime parse error: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl CheckinStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        let _ = store.open()?;
        Ok(store)
    }

    pub(crate) fn open(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(CHECKIN_SCHEMA)?;
        Ok(conn)
    }
}

pub(crate) fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub(crate) fn parse_optional_datetime(
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    match value {
        Some(raw) => Ok(Some(parse_datetime(raw)?)),
        None => Ok(None),
    }
}

pub(crate) fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    Ok(NaiveDate::parse_from_str(value, "%Y-%m-%d")?)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::CheckinStore;
    use crate::types::Employee;
    use tempfile::TempDir;

    pub(crate) fn temp_store() -> (TempDir, CheckinStore) {
        let temp = TempDir::new().expect("tempdir");
        let store = CheckinStore::new(temp.path().join("checkins.db")).expect("store");
        (temp, store)
    }

    pub(crate) fn employee(id: &str, name: &str, email: &str, active: bool) -> Employee {
        Employee {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            active,
        }
    }

    pub(crate) fn seed(store: &CheckinStore, employees: &[Employee]) {
        store.seed_employees(employees).expect("seed employees");
    }
}
