//! Nightly job: rebuild the denormalized last-known-state summary from the
//! full task history.

use tracing::info;

use crate::store::{build_summary_rows, CheckinStore};
use crate::BoxError;

/// Returns the number of summary rows written.
pub fn run(store: &CheckinStore) -> Result<usize, BoxError> {
    let source = store.fetch_summary_source()?;
    let rows = build_summary_rows(&source);
    let written = store.upsert_summary(&rows)?;
    info!(
        "summary rebuilt: {} source rows into {} summary rows",
        source.len(),
        written
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::{employee, seed, temp_store};
    use crate::types::RawTask;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        "2026-08-27".parse().expect("date")
    }

    #[test]
    fn empty_history_writes_nothing() {
        let (_tmp, store) = temp_store();
        assert_eq!(run(&store).expect("run"), 0);
    }

    #[test]
    fn rebuild_is_idempotent_over_the_task_history() {
        let (_tmp, store) = temp_store();
        let ana = employee("e1", "Ana", "ana@acme.test", true);
        seed(&store, std::slice::from_ref(&ana));
        let checkin = store
            .upsert_checkin(day(), &ana, Some("t-1"), Some("m-1"))
            .expect("checkin");
        store
            .replace_tasks(
                &checkin.id,
                &[
                    RawTask {
                        title: Some("Informe".to_string()),
                        status: Some("en_progreso".to_string()),
                        ..Default::default()
                    },
                    RawTask {
                        title: Some("Deploy".to_string()),
                        status: Some("completado".to_string()),
                        ..Default::default()
                    },
                ],
            )
            .expect("tasks");

        assert_eq!(run(&store).expect("first"), 2);
        assert_eq!(run(&store).expect("second"), 2);
    }
}
