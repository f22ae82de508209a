use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    format_date, format_datetime, parse_date, parse_optional_datetime, CheckinStore, StoreError,
};
use crate::types::{Checkin, Employee, PendingCheckin};

impl CheckinStore {
    /// Create-or-complete the check-in for `(date, employee)`.
    ///
    /// The row id is the correlation key (`thread_id`, else
    /// `first_message_id`). On conflict the row is merged: a correlation field
    /// already stored is never replaced, a field still null is patched in.
    /// The returned row is always re-read by key after the write, since write
    /// acknowledgments do not carry the merged representation on every path.
    pub fn upsert_checkin(
        &self,
        date: NaiveDate,
        employee: &Employee,
        thread_id: Option<&str>,
        first_message_id: Option<&str>,
    ) -> Result<Checkin, StoreError> {
        let checkin_id = thread_id
            .or(first_message_id)
            .ok_or(StoreError::InvalidIdentity)?;
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO checkins (id, date, employee_id, thread_id, first_message_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (date, employee_id) DO UPDATE SET
                 thread_id = COALESCE(checkins.thread_id, excluded.thread_id),
                 first_message_id = COALESCE(checkins.first_message_id, excluded.first_message_id)",
            params![
                checkin_id,
                format_date(date),
                employee.id,
                thread_id,
                first_message_id
            ],
        )?;

        self.checkin_by_key(&conn, date, &employee.id)?
            .ok_or_else(|| {
                StoreError::Storage(format!(
                    "check-in for ({}, {}) missing after upsert",
                    format_date(date),
                    employee.id
                ))
            })
    }

    /// Map an inbound thread to today's check-in. `None` means the thread does
    /// not correspond to a check-in created today; the message is ignored.
    pub fn checkin_by_thread_today(
        &self,
        thread_id: &str,
        today: NaiveDate,
    ) -> Result<Option<Checkin>, StoreError> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                "SELECT id, date, employee_id, thread_id, first_message_id, reply_received_at
                 FROM checkins
                 WHERE date = ?1 AND thread_id = ?2
                 LIMIT 1",
                params![format_date(today), thread_id],
                read_checkin_columns,
            )
            .optional()?;
        row.map(into_checkin).transpose()
    }

    /// Stamp the reply timestamp. Idempotent: a second call just overwrites
    /// with the later timestamp.
    pub fn mark_replied(
        &self,
        checkin_id: &str,
        ts: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let when = ts.unwrap_or_else(Utc::now);
        let conn = self.open()?;
        conn.execute(
            "UPDATE checkins SET reply_received_at = ?1 WHERE id = ?2",
            params![format_datetime(when), checkin_id],
        )?;
        Ok(())
    }

    /// Today's check-ins of active employees still waiting for a reply, for
    /// the reminder job.
    pub fn pending_checkins_today(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<PendingCheckin>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.thread_id, c.date, e.name, e.email
             FROM checkins c
             JOIN employees e ON e.id = c.employee_id
             WHERE c.date = ?1
               AND e.active = 1
               AND c.reply_received_at IS NULL
             ORDER BY e.id",
        )?;
        let rows = stmt.query_map(params![format_date(today)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut pending = Vec::new();
        for row in rows {
            let (checkin_id, thread_id, date_raw, name, email) = row?;
            pending.push(PendingCheckin {
                checkin_id,
                thread_id,
                date: parse_date(&date_raw)?,
                employee_name: name.unwrap_or_default(),
                employee_email: email.unwrap_or_default(),
            });
        }
        Ok(pending)
    }

    fn checkin_by_key(
        &self,
        conn: &Connection,
        date: NaiveDate,
        employee_id: &str,
    ) -> Result<Option<Checkin>, StoreError> {
        let row = conn
            .query_row(
                "SELECT id, date, employee_id, thread_id, first_message_id, reply_received_at
                 FROM checkins
                 WHERE date = ?1 AND employee_id = ?2
                 LIMIT 1",
                params![format_date(date), employee_id],
                read_checkin_columns,
            )
            .optional()?;
        row.map(into_checkin).transpose()
    }
}

type CheckinColumns = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn read_checkin_columns(row: &Row<'_>) -> rusqlite::Result<CheckinColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_checkin(columns: CheckinColumns) -> Result<Checkin, StoreError> {
    let (id, date_raw, employee_id, thread_id, first_message_id, reply_raw) = columns;
    Ok(Checkin {
        id,
        date: parse_date(&date_raw)?,
        employee_id,
        thread_id,
        first_message_id,
        reply_received_at: parse_optional_datetime(reply_raw.as_deref())?,
    })
}
