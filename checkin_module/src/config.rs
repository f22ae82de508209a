use std::env;
use std::path::PathBuf;

use crate::extractor::PromptRef;
use crate::BoxError;

/// Runtime configuration for the check-in jobs, loaded from the environment
/// (a `.env` file is honored when present).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
    /// Address the daily/reminder/digest mail goes out from.
    pub gmail_sender: String,
    /// Recipient of the management digest.
    pub manager_email: Option<String>,
    pub openai_api_key: String,
    pub reply_prompt: PromptRef,
    pub summary_prompt: PromptRef,
    /// Optional JSON file of employees loaded into the directory table
    /// before the daily send.
    pub employees_seed_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, BoxError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("CHECKIN_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("state/checkins.db"));
        let gmail_sender = required("GMAIL_SENDER")?;
        let manager_email = optional("MANAGER_EMAIL");
        let openai_api_key = required("OPENAI_API_KEY")?;
        let reply_prompt = PromptRef {
            id: required("OPEN_AI_PROMPT_ID")?,
            version: optional("OPEN_AI_PROMPT_VERSION"),
        };
        let summary_prompt = PromptRef {
            id: required("SUMMARY_PROMPT_ID")?,
            version: optional("SUMMARY_PROMPT_VERSION"),
        };
        let employees_seed_path = optional("EMPLOYEES_SEED_PATH").map(PathBuf::from);

        Ok(Self {
            db_path,
            gmail_sender,
            manager_email,
            openai_api_key,
            reply_prompt,
            summary_prompt,
            employees_seed_path,
        })
    }
}

fn required(name: &'static str) -> Result<String, BoxError> {
    optional(name).ok_or_else(|| format!("missing environment variable: {name}").into())
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
