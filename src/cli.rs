// src/cli.rs
use crate::config::{Config, DEFAULT_TIMEOUT};
use crate::event_form::NewEvent;
use crate::filter::CategoryFilter;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "campus-calendar", version, about = "Circle, job hunting and university events in one month calendar")]
pub struct Cli {
    /// JSON file holding your own events
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Per-request timeout for the remote sources
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Write logs to this file (the interactive view always logs to a file)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive month calendar (default)
    View {
        /// Month to open, YYYY-MM
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Print the events of a month
    Print {
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
        /// all, circle, jobHunting or university
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        /// Only show events of this type (repeatable)
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,
    },
    /// Add a personal event
    Add {
        #[arg(long, default_value = "")]
        title: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long = "type", default_value = "")]
        event_type: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Print a link that adds an event to your online calendar
    Export {
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
}

impl Command {
    /// The form input carried by `add`.
    pub fn new_event(&self) -> Option<NewEvent> {
        match self {
            Command::Add { title, date, time, location, event_type, description } => Some(NewEvent {
                title: title.clone(),
                date: date.clone(),
                time: time.clone(),
                location: location.clone(),
                event_type: event_type.clone(),
                description: description.clone(),
            }),
            _ => None,
        }
    }
}

impl Cli {
    pub fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            store_path: self.store.clone().unwrap_or(defaults.store_path),
            request_timeout: self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT),
            log_file: self.log_file.clone(),
            log_level: self.log_level,
            ..defaults
        }
    }
}

/// `YYYY-MM` -> first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| format!("invalid month '{}', expected YYYY-MM", s))
}
