//! Minimal Gmail REST client for the daily check-in workflow.
//!
//! Sends plain-text messages (optionally threaded into an existing
//! conversation), lists message refs by search query, and fetches a full
//! message with the plain-text body decoded out of the MIME part tree.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub mod auth;

pub use auth::{AuthError, GoogleAuth, GoogleAuthConfig, TokenState};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gmail api returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("missing field in gmail response: {0}")]
    MissingField(&'static str),
}

/// Acknowledgment for an outbound send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub id: String,
    pub thread_id: Option<String>,
}

/// Lightweight message reference returned by a list query.
#[derive(Debug, Clone)]
pub struct MessageRef {
    pub id: String,
    pub thread_id: Option<String>,
}

/// Fully fetched message with the interesting parts already extracted.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub text_body: Option<String>,
}

#[derive(Debug)]
pub struct GmailClient {
    http: reqwest::blocking::Client,
    auth: GoogleAuth,
    sender: String,
    base_url: String,
}

impl GmailClient {
    pub fn new(auth: GoogleAuth, sender: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            auth,
            sender: sender.into(),
            base_url: GMAIL_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn auth(&self) -> &GoogleAuth {
        &self.auth
    }

    /// Send a plain-text message. `thread_id` threads the message into an
    /// existing conversation; `in_reply_to` sets the RFC 2822 reply headers.
    pub fn send_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        thread_id: Option<&str>,
        in_reply_to: Option<&str>,
    ) -> Result<SentMessage, MailError> {
        let raw = build_raw_message(&self.sender, to, subject, body, in_reply_to);
        let mut payload = json!({ "raw": URL_SAFE.encode(raw.as_bytes()) });
        if let Some(thread_id) = thread_id {
            payload["threadId"] = json!(thread_id);
        }

        let token = self.auth.access_token()?;
        let response = self
            .http
            .post(format!("{}/users/me/messages/send", self.base_url))
            .bearer_auth(token)
            .json(&payload)
            .send()?;
        let sent: GmailSendResponse = expect_success(response)?;
        debug!("gmail send ok id={} thread={:?}", sent.id, sent.thread_id);
        Ok(SentMessage {
            id: sent.id,
            thread_id: sent.thread_id,
        })
    }

    /// List message refs matching a Gmail search query.
    pub fn list_messages(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<MessageRef>, MailError> {
        let token = self.auth.access_token()?;
        let response = self
            .http
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(token)
            .query(&[("q", query), ("maxResults", &max_results.to_string())])
            .send()?;
        let listing: GmailListResponse = expect_success(response)?;
        Ok(listing
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|entry| MessageRef {
                id: entry.id,
                thread_id: entry.thread_id,
            })
            .collect())
    }

    /// Fetch a message in full format and decode its plain-text body.
    pub fn fetch_message(&self, id: &str) -> Result<InboundMessage, MailError> {
        let token = self.auth.access_token()?;
        let response = self
            .http
            .get(format!("{}/users/me/messages/{}", self.base_url, id))
            .bearer_auth(token)
            .query(&[("format", "full")])
            .send()?;
        let full: GmailFullMessage = expect_success(response)?;
        let thread_id = full.thread_id.ok_or(MailError::MissingField("threadId"))?;
        let payload = full.payload.unwrap_or_default();
        Ok(InboundMessage {
            id: full.id,
            thread_id,
            subject: payload.header_value("Subject").unwrap_or("").to_string(),
            text_body: decode_text_body(&payload),
        })
    }
}

fn build_raw_message(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
    in_reply_to: Option<&str>,
) -> String {
    let mut message = String::new();
    message.push_str(&format!("From: {}\r\n", from));
    message.push_str(&format!("To: {}\r\n", to));
    message.push_str(&format!("Subject: {}\r\n", subject));
    if let Some(reply_id) = in_reply_to {
        message.push_str(&format!("In-Reply-To: {}\r\n", reply_id));
        message.push_str(&format!("References: {}\r\n", reply_id));
    }
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n");
    message.push_str(body);
    message
}

/// Decode the plain-text body of a full message payload: prefer a direct
/// `text/plain` part, fall back to the top-level body.
fn decode_text_body(payload: &GmailPayload) -> Option<String> {
    if let Some(parts) = payload.parts.as_ref() {
        for part in parts {
            if part.mime_type.as_deref() == Some("text/plain") {
                if let Some(text) = part.body_text() {
                    return Some(text);
                }
            }
        }
        return None;
    }
    payload.body_text()
}

fn expect_success<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, MailError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(MailError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json()?)
}

#[derive(Debug, Deserialize)]
struct GmailSendResponse {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailListResponse {
    messages: Option<Vec<GmailListEntry>>,
}

#[derive(Debug, Deserialize)]
struct GmailListEntry {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailFullMessage {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
    payload: Option<GmailPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct GmailPayload {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    headers: Option<Vec<GmailHeader>>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPayload>>,
}

impl GmailPayload {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|header| header.name.eq_ignore_ascii_case(name))
                .map(|header| header.value.as_str())
        })
    }

    fn body_text(&self) -> Option<String> {
        let data = self.body.as_ref()?.data.as_deref()?;
        // Gmail emits base64url with and without padding depending on the path.
        let bytes = URL_SAFE
            .decode(data.as_bytes())
            .or_else(|_| URL_SAFE_NO_PAD.decode(data.as_bytes()))
            .ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct GmailBody {
    data: Option<String>,
}
