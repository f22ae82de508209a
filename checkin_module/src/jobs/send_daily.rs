//! Morning job: one status-request email per active employee, each recorded
//! as the day's check-in row.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::jobs::RunTally;
use crate::mailer::Mailer;
use crate::store::CheckinStore;
use crate::templates;
use crate::types::Employee;
use crate::BoxError;

pub fn run(
    store: &CheckinStore,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> Result<RunTally, BoxError> {
    let employees = store.active_employees()?;
    if employees.is_empty() {
        // An empty directory means misconfiguration, not a quiet day.
        return Err("no active employees in the directory".into());
    }

    let mut tally = RunTally {
        total: employees.len(),
        ..Default::default()
    };
    for employee in &employees {
        let email = employee.email.trim();
        if email.is_empty() {
            warn!("employee {} has no email, skipping", employee.id);
            tally.skipped += 1;
            continue;
        }
        match send_one(store, mailer, today, employee, email) {
            Ok(()) => tally.ok += 1,
            Err(err) => {
                error!("daily send failed for {}: {err}", employee.id);
                tally.failed += 1;
            }
        }
    }
    info!("daily check-in send finished: {tally}");
    Ok(tally)
}

fn send_one(
    store: &CheckinStore,
    mailer: &dyn Mailer,
    today: NaiveDate,
    employee: &Employee,
    email: &str,
) -> Result<(), BoxError> {
    let name = employee.display_name();
    let carried = store.pending_tasks_for_employee(&employee.id)?;
    let subject = format!("Seguimiento diario - {today} — {name}");
    let body = templates::render_daily(&name, today, &carried);
    let sent = mailer.send(email, &subject, &body, None)?;
    store.upsert_checkin(today, employee, sent.thread_id.as_deref(), Some(&sent.id))?;
    Ok(())
}
