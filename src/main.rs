// src/main.rs
use anyhow::{Context, Result, anyhow};
use campus_calendar::app::{self, App};
use campus_calendar::cli::{Cli, Command};
use campus_calendar::config::Config;
use campus_calendar::export::calendar_link;
use campus_calendar::logging;
use campus_calendar::session::CalendarSession;
use campus_calendar::ui::month_report;
use chrono::{Local, NaiveDate, Utc};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    let command = cli.command.clone().unwrap_or(Command::View { month: None });
    let today: NaiveDate = Local::now().date_naive();

    if let Command::View { month } = command {
        let log_path = config.log_file.clone().unwrap_or_else(logging::default_log_path);
        logging::init_file_logger(&log_path, config.log_level)
            .with_context(|| format!("failed to open log file {}", log_path.display()))?;
        let session = build_session(&config)?;
        return app::start_ui(App::new(month.unwrap_or(today)), &session).await;
    }

    match &config.log_file {
        Some(path) => logging::init_file_logger(path, config.log_level)?,
        None => logging::init_stderr_logger(config.log_level)?,
    }
    let session = build_session(&config)?;

    match &command {
        Command::Print { month, category, types } => {
            let snapshot = session.load_month(month.unwrap_or(today)).await;
            print!("{}", month_report(&snapshot, *category, types));
        }
        Command::Add { .. } => {
            let input = command.new_event().ok_or_else(|| anyhow!("missing event input"))?;
            let event = session.add_event(input, Utc::now())?;
            println!("Added event:\n{}", event);
        }
        Command::Export { id, month } => {
            let snapshot = session.load_month(month.unwrap_or(today)).await;
            let event = snapshot
                .events()
                .iter()
                .find(|e| e.id() == id.as_str())
                .ok_or_else(|| anyhow!("no event with id '{}' in {}", id, snapshot.reference().format("%Y-%m")))?;
            println!("{}", calendar_link(event)?);
        }
        Command::View { .. } => {}
    }

    Ok(())
}

fn build_session(config: &Config) -> Result<CalendarSession> {
    CalendarSession::from_config(config).context("failed to create HTTP client")
}
