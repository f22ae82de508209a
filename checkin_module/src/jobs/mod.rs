//! Batch jobs, one per cron trigger. Every job runs to completion over a
//! list fetched once at start; a unit's failure is logged and counted, never
//! fatal to the run.

use std::fmt;

pub mod ingest_replies;
pub mod send_daily;
pub mod send_digest;
pub mod send_reminder;
pub mod update_summary;

/// End-of-run counters for the per-employee jobs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub total: usize,
    pub ok: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for RunTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} ok={} skipped={} failed={}",
            self.total, self.ok, self.skipped, self.failed
        )
    }
}

/// End-of-run counters for reply ingestion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestTally {
    pub processed: usize,
    pub saved: usize,
}

impl fmt::Display for IngestTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processed={} saved={}", self.processed, self.saved)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};

    use crate::extractor::{ExtractError, Extractor};
    use crate::mailer::{InboundMessage, Mailer, MessageRef, SentMessage};
    use crate::types::ExtractedReply;
    use crate::BoxError;

    #[derive(Debug, Clone)]
    pub(crate) struct SentRecord {
        pub(crate) to: String,
        pub(crate) subject: String,
        pub(crate) body: String,
        pub(crate) thread_id: Option<String>,
    }

    /// In-memory mail transport: records sends, serves a fixed inbox.
    #[derive(Debug, Default)]
    pub(crate) struct MockMailer {
        pub(crate) sent: RefCell<Vec<SentRecord>>,
        pub(crate) fail_to: Option<String>,
        pub(crate) inbox: Vec<InboundMessage>,
        counter: Cell<usize>,
    }

    impl MockMailer {
        pub(crate) fn failing_for(address: &str) -> Self {
            Self {
                fail_to: Some(address.to_string()),
                ..Default::default()
            }
        }

        pub(crate) fn with_inbox(inbox: Vec<InboundMessage>) -> Self {
            Self {
                inbox,
                ..Default::default()
            }
        }
    }

    impl Mailer for MockMailer {
        fn send(
            &self,
            to: &str,
            subject: &str,
            body: &str,
            thread_id: Option<&str>,
        ) -> Result<SentMessage, BoxError> {
            if self.fail_to.as_deref() == Some(to) {
                return Err(format!("smtp rejected {to}").into());
            }
            let n = self.counter.get() + 1;
            self.counter.set(n);
            self.sent.borrow_mut().push(SentRecord {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
                thread_id: thread_id.map(str::to_string),
            });
            Ok(SentMessage {
                id: format!("m-{n}"),
                thread_id: Some(thread_id.map(str::to_string).unwrap_or(format!("t-{n}"))),
            })
        }

        fn list_messages(
            &self,
            _query: &str,
            _max_results: u32,
        ) -> Result<Vec<MessageRef>, BoxError> {
            Ok(self
                .inbox
                .iter()
                .map(|message| MessageRef {
                    id: message.id.clone(),
                    thread_id: Some(message.thread_id.clone()),
                })
                .collect())
        }

        fn fetch_message(&self, id: &str) -> Result<InboundMessage, BoxError> {
            self.inbox
                .iter()
                .find(|message| message.id == id)
                .cloned()
                .ok_or_else(|| format!("no such message: {id}").into())
        }
    }

    /// Canned extractor: returns a fixed reply per employee name, or fails.
    #[derive(Debug, Default)]
    pub(crate) struct MockExtractor {
        pub(crate) reply: Option<ExtractedReply>,
        pub(crate) summary: String,
        pub(crate) fail: bool,
    }

    impl Extractor for MockExtractor {
        fn extract_reply(
            &self,
            _subject: &str,
            _body: &str,
            _reference_date: &str,
            _employee: &str,
        ) -> Result<ExtractedReply, ExtractError> {
            if self.fail {
                return Err(ExtractError::EmptyOutput);
            }
            self.reply.clone().ok_or(ExtractError::EmptyOutput)
        }

        fn summarize_tasks(&self, _payload: &str) -> Result<String, ExtractError> {
            if self.fail {
                return Err(ExtractError::EmptyOutput);
            }
            Ok(self.summary.clone())
        }
    }
}
