use rusqlite::{params, Connection, OptionalExtension};

use super::{CheckinStore, StoreError};
use crate::normalize::normalize_task;
use crate::types::{
    NormalizedTask, OpenTask, PendingTask, PersistedTask, RawTask, OBSERVACION_SIN_PROGRESO,
};

#[derive(Debug)]
struct PriorTask {
    id: i64,
    progress: Option<i64>,
}

impl CheckinStore {
    /// Replace the check-in's task set with the reconciled batch.
    ///
    /// Each raw task is normalized, diffed against the most recent task row
    /// with the same title outside this check-in (title is the sole match
    /// key, across all employees), and stamped with the stagnation
    /// observation when progress did not move. A matched prior row is deleted
    /// immediately after the decision; the inserts for the whole call are
    /// batched at the end. Empty input short-circuits before any store
    /// access.
    pub fn replace_tasks(
        &self,
        checkin_id: &str,
        tasks: &[RawTask],
    ) -> Result<Vec<PersistedTask>, StoreError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.open()?;
        // Supersede the check-in's own previous rows so re-running
        // reconciliation for the same check-in is idempotent.
        conn.execute(
            "DELETE FROM tasks WHERE checkin_id = ?1",
            params![checkin_id],
        )?;

        let mut batch: Vec<(NormalizedTask, String)> = Vec::new();
        for raw in tasks {
            let Some(task) = normalize_task(raw) else {
                continue;
            };
            let prior = latest_prior_task(&conn, &task.title, checkin_id)?;
            let (observation, prior_id) = match prior {
                None => (String::new(), None),
                Some(prior) if prior.progress == task.progress => {
                    (OBSERVACION_SIN_PROGRESO.to_string(), Some(prior.id))
                }
                Some(prior) => (String::new(), Some(prior.id)),
            };
            if let Some(id) = prior_id {
                conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            }
            batch.push((task, observation));
        }

        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(batch.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks (checkin_id, title, status, progress, next_steps, blocker, observation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (task, observation) in &batch {
                stmt.execute(params![
                    checkin_id,
                    task.title,
                    task.status.as_str(),
                    task.progress,
                    task.next_steps,
                    task.blocker,
                    observation,
                ])?;
                created.push(PersistedTask {
                    id: tx.last_insert_rowid(),
                    checkin_id: checkin_id.to_string(),
                    title: task.title.clone(),
                    status: task.status,
                    progress: task.progress,
                    next_steps: task.next_steps.clone(),
                    blocker: task.blocker.clone(),
                    observation: observation.clone(),
                });
            }
        }
        tx.commit()?;
        Ok(created)
    }

    /// Tasks of the employee's check-ins that are not completed, for the
    /// daily email listing. NULL-status rows drop out of the `!=` predicate,
    /// matching the source query's semantics.
    pub fn pending_tasks_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<PendingTask>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT t.title, t.status, t.progress, t.next_steps, t.blocker
             FROM tasks t
             JOIN checkins c ON c.id = t.checkin_id
             WHERE c.employee_id = ?1
               AND t.status != 'completado'
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![employee_id], |row| {
            Ok(PendingTask {
                title: row.get(0)?,
                status: row.get(1)?,
                progress: row.get(2)?,
                next_steps: row.get(3)?,
                blocker: row.get(4)?,
            })
        })?;
        collect_rows(rows)
    }

    /// Tasks whose status is literally NULL, joined with the employee name,
    /// for the management digest.
    pub fn today_open_tasks(&self) -> Result<Vec<OpenTask>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT e.name, t.title, t.status, t.progress, t.next_steps, t.blocker
             FROM tasks t
             JOIN checkins c ON c.id = t.checkin_id
             JOIN employees e ON e.id = c.employee_id
             WHERE t.status IS NULL
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(OpenTask {
                employee_name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                title: row.get(1)?,
                status: row.get(2)?,
                progress: row.get(3)?,
                next_steps: row.get(4)?,
                blocker: row.get(5)?,
            })
        })?;
        collect_rows(rows)
    }
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Most recent task row with the same title, excluding the check-in being
/// reconciled.
fn latest_prior_task(
    conn: &Connection,
    title: &str,
    checkin_id: &str,
) -> Result<Option<PriorTask>, StoreError> {
    conn.query_row(
        "SELECT id, progress FROM tasks
         WHERE title = ?1 AND checkin_id != ?2
         ORDER BY id DESC
         LIMIT 1",
        params![title, checkin_id],
        |row| {
            Ok(PriorTask {
                id: row.get(0)?,
                progress: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}
