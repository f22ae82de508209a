use std::env;
use std::fs;
use std::process;

use checkin_module::config::ServiceConfig;
use checkin_module::extractor::OpenAiExtractor;
use checkin_module::jobs;
use checkin_module::store::CheckinStore;
use checkin_module::types::Employee;
use checkin_module::BoxError;
use gmail_module::{GmailClient, GoogleAuth};
use tracing::{info, warn};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let command = match env::args().nth(1) {
        Some(command) => command,
        None => {
            print_usage();
            process::exit(2);
        }
    };

    if let Err(err) = dispatch(&command) {
        eprintln!("checkin-jobs {command}: {err}");
        process::exit(1);
    }
}

fn dispatch(command: &str) -> Result<(), BoxError> {
    let config = ServiceConfig::from_env()?;
    let store = CheckinStore::new(&config.db_path)?;
    let today = chrono::Local::now().date_naive();

    match command {
        "send-daily" => {
            seed_employees_if_configured(&store, &config)?;
            let mailer = gmail_client(&config)?;
            let tally = jobs::send_daily::run(&store, &mailer, today)?;
            println!("send-daily: {tally}");
        }
        "ingest-replies" => {
            let mailer = gmail_client(&config)?;
            let extractor = extractor(&config);
            let tally = jobs::ingest_replies::run(&store, &mailer, &extractor, today)?;
            println!("ingest-replies: {tally}");
        }
        "send-reminder" => {
            let mailer = gmail_client(&config)?;
            let tally = jobs::send_reminder::run(&store, &mailer, today)?;
            println!("send-reminder: {tally}");
        }
        "send-digest" => {
            let mailer = gmail_client(&config)?;
            let extractor = extractor(&config);
            let produced = jobs::send_digest::run(
                &store,
                &mailer,
                &extractor,
                config.manager_email.as_deref(),
                today,
            )?;
            println!(
                "send-digest: {}",
                if produced { "sent" } else { "skipped" }
            );
        }
        "update-summary" => {
            let written = jobs::update_summary::run(&store)?;
            println!("update-summary: {written} rows");
        }
        _ => {
            print_usage();
            process::exit(2);
        }
    }
    Ok(())
}

fn gmail_client(config: &ServiceConfig) -> Result<GmailClient, BoxError> {
    let auth = GoogleAuth::from_env()?;
    Ok(GmailClient::new(auth, config.gmail_sender.clone()))
}

fn extractor(config: &ServiceConfig) -> OpenAiExtractor {
    OpenAiExtractor::new(
        config.openai_api_key.clone(),
        config.reply_prompt.clone(),
        config.summary_prompt.clone(),
    )
}

/// Load the optional employee seed file into the directory table. Existing
/// rows win; the file only fills gaps.
fn seed_employees_if_configured(
    store: &CheckinStore,
    config: &ServiceConfig,
) -> Result<(), BoxError> {
    let Some(path) = &config.employees_seed_path else {
        return Ok(());
    };
    if !path.exists() {
        warn!("employee seed file {} not found, skipping", path.display());
        return Ok(());
    }
    let raw = fs::read_to_string(path)?;
    let employees: Vec<Employee> = serde_json::from_str(&raw)?;
    let inserted = store.seed_employees(&employees)?;
    info!(
        "seeded {} of {} employees from {}",
        inserted,
        employees.len(),
        path.display()
    );
    Ok(())
}

fn print_usage() {
    eprintln!("usage: checkin-jobs <command>");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  send-daily      send the daily status-request email to every active employee");
    eprintln!("  ingest-replies  pull today's replies and persist the extracted tasks");
    eprintln!("  send-reminder   nudge employees whose check-in is still unanswered");
    eprintln!("  send-digest     mail the open-task summary to the manager");
    eprintln!("  update-summary  rebuild the denormalized summary table");
}
