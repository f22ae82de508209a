//! Midday job: nudge every employee whose check-in is still unanswered,
//! replying into the morning thread when one exists.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::jobs::RunTally;
use crate::mailer::Mailer;
use crate::store::CheckinStore;
use crate::templates;
use crate::types::PendingCheckin;
use crate::BoxError;

pub fn run(
    store: &CheckinStore,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> Result<RunTally, BoxError> {
    let pending = store.pending_checkins_today(today)?;
    let mut tally = RunTally {
        total: pending.len(),
        ..Default::default()
    };
    for checkin in &pending {
        if checkin.employee_email.trim().is_empty() {
            warn!("pending check-in {} has no employee email", checkin.checkin_id);
            tally.skipped += 1;
            continue;
        }
        match remind_one(mailer, checkin) {
            Ok(()) => tally.ok += 1,
            Err(err) => {
                error!("reminder failed for check-in {}: {err}", checkin.checkin_id);
                tally.failed += 1;
            }
        }
    }
    info!("reminder send finished: {tally}");
    Ok(tally)
}

fn remind_one(mailer: &dyn Mailer, checkin: &PendingCheckin) -> Result<(), BoxError> {
    let name = if checkin.employee_name.trim().is_empty() {
        checkin.employee_email.as_str()
    } else {
        checkin.employee_name.as_str()
    };
    let subject = format!("Seguimiento diario - {} — {name}", checkin.date);
    let body = templates::render_reminder(name);
    mailer.send(
        checkin.employee_email.trim(),
        &subject,
        &body,
        checkin.thread_id.as_deref(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::MockMailer;
    use crate::store::testutil::{employee, seed, temp_store};

    fn day() -> NaiveDate {
        "2026-08-27".parse().expect("date")
    }

    #[test]
    fn no_pending_checkins_means_no_mail() {
        let (_tmp, store) = temp_store();
        let mailer = MockMailer::default();
        let tally = run(&store, &mailer, day()).expect("run");
        assert_eq!(tally, RunTally::default());
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn reminders_go_into_the_original_thread() {
        let (_tmp, store) = temp_store();
        let ana = employee("e1", "Ana", "ana@acme.test", true);
        let luis = employee("e2", "Luis", "luis@acme.test", true);
        seed(&store, &[ana.clone(), luis.clone()]);
        store
            .upsert_checkin(day(), &ana, Some("t-1"), Some("m-1"))
            .expect("checkin ana");
        let replied = store
            .upsert_checkin(day(), &luis, Some("t-2"), Some("m-2"))
            .expect("checkin luis");
        store.mark_replied(&replied.id, None).expect("mark");

        let mailer = MockMailer::default();
        let tally = run(&store, &mailer, day()).expect("run");
        assert_eq!(tally, RunTally { total: 1, ok: 1, skipped: 0, failed: 0 });

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@acme.test");
        assert_eq!(sent[0].thread_id.as_deref(), Some("t-1"));
        assert!(sent[0].body.contains("recordatorio"));
    }

    #[test]
    fn a_failed_reminder_does_not_stop_the_rest() {
        let (_tmp, store) = temp_store();
        let ana = employee("e1", "Ana", "ana@acme.test", true);
        let luis = employee("e2", "Luis", "luis@acme.test", true);
        seed(&store, &[ana.clone(), luis.clone()]);
        store
            .upsert_checkin(day(), &ana, Some("t-1"), Some("m-1"))
            .expect("checkin ana");
        store
            .upsert_checkin(day(), &luis, Some("t-2"), Some("m-2"))
            .expect("checkin luis");

        let mailer = MockMailer::failing_for("ana@acme.test");
        let tally = run(&store, &mailer, day()).expect("run");
        assert_eq!(tally, RunTally { total: 2, ok: 1, skipped: 0, failed: 1 });
    }
}
