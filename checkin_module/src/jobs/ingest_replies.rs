//! Afternoon job: pull today's reply threads from the mailbox, run each body
//! through the extraction prompt, and persist the reconciled task list.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::extractor::Extractor;
use crate::jobs::IngestTally;
use crate::mailer::Mailer;
use crate::store::CheckinStore;
use crate::BoxError;

const MAX_MESSAGES: u32 = 50;

pub fn run(
    store: &CheckinStore,
    mailer: &dyn Mailer,
    extractor: &dyn Extractor,
    today: NaiveDate,
) -> Result<IngestTally, BoxError> {
    let query =
        format!("subject:\"[Seguimiento diario] {today}\" newer_than:2d to:me in:inbox");
    let refs = mailer.list_messages(&query, MAX_MESSAGES)?;
    info!("reply ingest: {} candidate messages", refs.len());

    let mut tally = IngestTally::default();
    for message_ref in &refs {
        match ingest_one(store, mailer, extractor, today, &message_ref.id) {
            Ok(saved) => {
                tally.processed += 1;
                if saved {
                    tally.saved += 1;
                }
            }
            Err(err) => error!("reply ingest failed for message {}: {err}", message_ref.id),
        }
    }
    info!("reply ingest finished: {tally}");
    Ok(tally)
}

/// Returns whether the message resulted in a saved check-in reply. Messages
/// without a matching check-in thread or without a text body are skipped.
fn ingest_one(
    store: &CheckinStore,
    mailer: &dyn Mailer,
    extractor: &dyn Extractor,
    today: NaiveDate,
    message_id: &str,
) -> Result<bool, BoxError> {
    let message = mailer.fetch_message(message_id)?;
    let Some(checkin) = store.checkin_by_thread_today(&message.thread_id, today)? else {
        warn!(
            "message {} belongs to no check-in thread for today, skipping",
            message.id
        );
        return Ok(false);
    };
    let Some(body) = message.text_body.as_deref().map(str::trim).filter(|b| !b.is_empty())
    else {
        warn!("message {} has no text body, skipping", message.id);
        return Ok(false);
    };

    let employee_name = store.employee_display_name(&checkin.employee_id)?;
    let reply = extractor.extract_reply(
        &message.subject,
        body,
        &today.to_string(),
        &employee_name,
    )?;
    let persisted = store.replace_tasks(&checkin.id, &reply.tasks)?;
    store.mark_replied(&checkin.id, None)?;
    info!(
        "saved reply for {}: {} tasks",
        checkin.employee_id,
        persisted.len()
    );
    Ok(true)
}
