//! Structured extraction of check-in replies via OpenAI stored prompts.
//!
//! The extractor is untrusted: its JSON goes through a defensive key-remap
//! layer (Spanish alternate spellings) before schema validation, and task
//! fields are only trusted after [`crate::normalize`] has cleaned them.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::types::ExtractedReply;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("openai api returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed extractor json: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("extractor response missing output text")]
    EmptyOutput,
}

/// Seam for the AI extraction calls so jobs can run against a test double.
pub trait Extractor {
    /// Turn a reply email into a validated task list.
    fn extract_reply(
        &self,
        subject: &str,
        body: &str,
        reference_date: &str,
        employee: &str,
    ) -> Result<ExtractedReply, ExtractError>;

    /// Turn the open-task dump into the management digest body.
    fn summarize_tasks(&self, payload: &str) -> Result<String, ExtractError>;
}

/// Stored-prompt reference (id plus optional pinned version).
#[derive(Debug, Clone)]
pub struct PromptRef {
    pub id: String,
    pub version: Option<String>,
}

#[derive(Debug)]
pub struct OpenAiExtractor {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    reply_prompt: PromptRef,
    summary_prompt: PromptRef,
}

impl OpenAiExtractor {
    pub fn new(api_key: impl Into<String>, reply_prompt: PromptRef, summary_prompt: PromptRef) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
            reply_prompt,
            summary_prompt,
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn run_prompt(&self, prompt: &PromptRef, message: &str) -> Result<String, ExtractError> {
        let mut prompt_body = json!({
            "id": prompt.id,
            "variables": { "message": message },
        });
        if let Some(version) = prompt.version.as_deref() {
            prompt_body["version"] = json!(version);
        }

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "prompt": prompt_body }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let reply: ResponsesReply = response.json()?;
        reply.output_text().ok_or(ExtractError::EmptyOutput)
    }
}

impl Extractor for OpenAiExtractor {
    fn extract_reply(
        &self,
        subject: &str,
        body: &str,
        reference_date: &str,
        employee: &str,
    ) -> Result<ExtractedReply, ExtractError> {
        let message = build_message(subject, reference_date, employee, body);
        let raw = self.run_prompt(&self.reply_prompt, &message)?;
        debug!("extractor raw output: {}", raw);
        parse_extracted_reply(&raw)
    }

    fn summarize_tasks(&self, payload: &str) -> Result<String, ExtractError> {
        self.run_prompt(&self.summary_prompt, payload)
    }
}

/// Single context block handed to the stored prompt.
fn build_message(subject: &str, reference_date: &str, employee: &str, body: &str) -> String {
    format!(
        "ASUNTO: {subject}\nFECHA_REFERENCIA: {reference_date}\nEMPLEADO: {employee}\n\nCUERPO:\n{body}"
    )
    .trim()
    .to_string()
}

/// Parse the prompt output into the reply schema, tolerating the Spanish
/// alternate key spellings.
pub fn parse_extracted_reply(raw: &str) -> Result<ExtractedReply, ExtractError> {
    let value: Value = serde_json::from_str(raw)?;
    let value = remap_reply_keys(value);
    Ok(serde_json::from_value(value)?)
}

/// Remap alternate key spellings onto the canonical schema. A key is only
/// remapped when the canonical one is absent.
fn remap_reply_keys(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        rename_key(obj, "fecha", "for_date");
        rename_key(obj, "empleado", "employee");
        rename_key(obj, "tareas", "tasks");
        if let Some(tasks) = obj.get_mut("tasks").and_then(Value::as_array_mut) {
            for task in tasks {
                if let Some(task) = task.as_object_mut() {
                    rename_key(task, "estado", "status");
                    rename_key(task, "progreso", "progress");
                    rename_key(task, "siguientes pasos", "next_steps");
                    rename_key(task, "bloqueo", "blocker");
                }
            }
        }
    }
    value
}

fn rename_key(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if !obj.contains_key(to) {
        if let Some(value) = obj.remove(from) {
            obj.insert(to.to_string(), value);
        }
    }
}

/// Minimal view of the Responses API reply: the stored prompt answers with
/// JSON in its output text.
#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutputItem {
    #[serde(default)]
    content: Vec<ResponsesContentItem>,
}

#[derive(Debug, Deserialize)]
struct ResponsesContentItem {
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    fn output_text(&self) -> Option<String> {
        if let Some(text) = self.output_text.as_deref() {
            return Some(text.to_string());
        }
        let mut out = String::new();
        for item in &self.output {
            for content in &item.content {
                if let Some(text) = content.text.as_deref() {
                    out.push_str(text);
                }
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}
