//! Mail transport seam used by the jobs.

use crate::BoxError;

pub use gmail_module::{GmailClient, InboundMessage, MessageRef, SentMessage};

/// Outbound + inbound mail operations the jobs depend on. Implemented by
/// [`GmailClient`]; job tests swap in a plain-struct double.
pub trait Mailer {
    /// Send a plain-text message; `thread_id` threads it into an existing
    /// conversation.
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        thread_id: Option<&str>,
    ) -> Result<SentMessage, BoxError>;

    /// List message refs matching a search query.
    fn list_messages(&self, query: &str, max_results: u32) -> Result<Vec<MessageRef>, BoxError>;

    /// Fetch one message in full, body already decoded.
    fn fetch_message(&self, id: &str) -> Result<InboundMessage, BoxError>;
}

impl Mailer for GmailClient {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        thread_id: Option<&str>,
    ) -> Result<SentMessage, BoxError> {
        Ok(self.send_message(to, subject, body, thread_id, None)?)
    }

    fn list_messages(&self, query: &str, max_results: u32) -> Result<Vec<MessageRef>, BoxError> {
        Ok(GmailClient::list_messages(self, query, max_results)?)
    }

    fn fetch_message(&self, id: &str) -> Result<InboundMessage, BoxError> {
        Ok(GmailClient::fetch_message(self, id)?)
    }
}
