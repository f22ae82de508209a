use rusqlite::params;

use super::{CheckinStore, StoreError};
use crate::types::{SummaryRow, SummarySource};

/// Upper bound on rows per summary upsert write.
pub const SUMMARY_CHUNK_SIZE: usize = 500;

impl CheckinStore {
    /// All task rows joined through check-ins to employee names; input of the
    /// summary rebuild.
    pub fn fetch_summary_source(&self) -> Result<Vec<SummarySource>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT e.name, t.title, t.status, t.observation
             FROM tasks t
             JOIN checkins c ON c.id = t.checkin_id
             JOIN employees e ON e.id = c.employee_id
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SummarySource {
                employee_name: row.get(0)?,
                task_title: row.get(1)?,
                status: row.get(2)?,
                observation: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Upsert the rebuilt rows in chunks of at most [`SUMMARY_CHUNK_SIZE`],
    /// keyed on `(employee_name, task_title)`. Returns the number of rows
    /// written.
    pub fn upsert_summary(&self, rows: &[SummaryRow]) -> Result<usize, StoreError> {
        let mut conn = self.open()?;
        let mut total = 0;
        for chunk in rows.chunks(SUMMARY_CHUNK_SIZE) {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO summary (employee_name, task_title, status, observation)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (employee_name, task_title) DO UPDATE SET
                         status = excluded.status,
                         observation = excluded.observation",
                )?;
                for row in chunk {
                    stmt.execute(params![
                        row.employee_name,
                        row.task_title,
                        row.status,
                        row.observation,
                    ])?;
                }
            }
            tx.commit()?;
            total += chunk.len();
        }
        Ok(total)
    }
}

/// Build the summary payload: trim both key halves, drop rows missing either
/// one, blank observations become NULL.
pub fn build_summary_rows(source: &[SummarySource]) -> Vec<SummaryRow> {
    let mut out = Vec::new();
    for row in source {
        let employee_name = trimmed(row.employee_name.as_deref());
        let task_title = trimmed(row.task_title.as_deref());
        if employee_name.is_empty() || task_title.is_empty() {
            // Both halves of the composite key are required.
            continue;
        }
        let observation = row
            .observation
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        out.push(SummaryRow {
            employee_name,
            task_title,
            status: trimmed(row.status.as_deref()),
            observation,
        });
    }
    out
}

fn trimmed(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_string()
}
