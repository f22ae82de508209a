use rusqlite::{params, OptionalExtension};

use super::{CheckinStore, StoreError};
use crate::types::Employee;

impl CheckinStore {
    /// Employees eligible for the daily send, in directory order.
    pub fn active_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, email, active FROM employees WHERE active = 1 ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Employee {
                id: row.get::<_, String>(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                email: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                active: row.get::<_, i64>(3)? != 0,
            })
        })?;
        let mut employees = Vec::new();
        for row in rows {
            employees.push(row?);
        }
        Ok(employees)
    }

    /// Resolve a display name for reply ingestion: name, else email, else the
    /// raw id.
    pub fn employee_display_name(&self, employee_id: &str) -> Result<String, StoreError> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                "SELECT name, email FROM employees WHERE id = ?1 LIMIT 1",
                params![employee_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;
        let (name, email) = row.unwrap_or((None, None));
        let name = name.unwrap_or_default().trim().to_string();
        if !name.is_empty() {
            return Ok(name);
        }
        let email = email.unwrap_or_default();
        if !email.is_empty() {
            return Ok(email);
        }
        Ok(employee_id.to_string())
    }

    /// Load employees into the directory table, keeping existing rows
    /// untouched. Bootstrap/fixture path; the directory stays externally
    /// owned.
    pub fn seed_employees(&self, employees: &[Employee]) -> Result<usize, StoreError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO employees (id, name, email, active)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for employee in employees {
                inserted += stmt.execute(params![
                    employee.id,
                    employee.name,
                    employee.email,
                    employee.active as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}
