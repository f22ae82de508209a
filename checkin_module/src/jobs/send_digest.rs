//! Evening job: summarize the open (still untyped-status) tasks through the
//! summary prompt and mail the digest to the manager.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::extractor::Extractor;
use crate::mailer::Mailer;
use crate::store::CheckinStore;
use crate::BoxError;

/// Returns whether a digest was produced. An empty open-task list or a
/// missing manager address yields `Ok(false)`.
pub fn run(
    store: &CheckinStore,
    mailer: &dyn Mailer,
    extractor: &dyn Extractor,
    manager_email: Option<&str>,
    today: NaiveDate,
) -> Result<bool, BoxError> {
    let open = store.today_open_tasks()?;
    if open.is_empty() {
        info!("no open tasks, skipping digest");
        return Ok(false);
    }
    let Some(manager) = manager_email.map(str::trim).filter(|m| !m.is_empty()) else {
        warn!("no manager address configured, skipping digest");
        return Ok(false);
    };

    let payload = serde_json::to_string_pretty(&open)?;
    let summary = extractor.summarize_tasks(&payload)?;
    let subject = format!("Resumen de tareas abiertas - {today}");
    if let Err(err) = mailer.send(manager, &subject, &summary, None) {
        // The digest is advisory; a failed send must not fail the cron run.
        error!("digest send failed: {err}");
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::{MockExtractor, MockMailer};
    use crate::store::testutil::{employee, seed, temp_store};

    fn day() -> NaiveDate {
        "2026-08-27".parse().expect("date")
    }

    fn store_with_open_task() -> (tempfile::TempDir, CheckinStore) {
        let (tmp, store) = temp_store();
        let ana = employee("e1", "Ana", "ana@acme.test", true);
        seed(&store, std::slice::from_ref(&ana));
        let checkin = store
            .upsert_checkin(day(), &ana, Some("t-1"), Some("m-1"))
            .expect("checkin");
        // An open task is one whose status column is literally NULL.
        let conn = store.open().expect("conn");
        conn.execute(
            "INSERT INTO tasks (checkin_id, title, status, observation)
             VALUES (?1, 'Informe', NULL, '')",
            rusqlite::params![checkin.id],
        )
        .expect("insert open task");
        (tmp, store)
    }

    #[test]
    fn no_open_tasks_produces_no_digest() {
        let (_tmp, store) = temp_store();
        let mailer = MockMailer::default();
        let extractor = MockExtractor::default();
        let produced =
            run(&store, &mailer, &extractor, Some("boss@acme.test"), day()).expect("run");
        assert!(!produced);
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn missing_manager_address_skips_the_digest() {
        let (_tmp, store) = store_with_open_task();
        let mailer = MockMailer::default();
        let extractor = MockExtractor::default();
        let produced = run(&store, &mailer, &extractor, None, day()).expect("run");
        assert!(!produced);
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn digest_is_mailed_to_the_manager() {
        let (_tmp, store) = store_with_open_task();
        let mailer = MockMailer::default();
        let extractor = MockExtractor {
            summary: "Resumen: 1 tarea abierta".to_string(),
            ..Default::default()
        };

        let produced =
            run(&store, &mailer, &extractor, Some("boss@acme.test"), day()).expect("run");
        assert!(produced);

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "boss@acme.test");
        assert_eq!(sent[0].subject, "Resumen de tareas abiertas - 2026-08-27");
        assert_eq!(sent[0].body, "Resumen: 1 tarea abierta");
    }

    #[test]
    fn a_failed_send_still_counts_as_produced() {
        let (_tmp, store) = store_with_open_task();
        let mailer = MockMailer::failing_for("boss@acme.test");
        let extractor = MockExtractor {
            summary: "Resumen".to_string(),
            ..Default::default()
        };
        let produced =
            run(&store, &mailer, &extractor, Some("boss@acme.test"), day()).expect("run");
        assert!(produced);
    }
}
