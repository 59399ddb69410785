// src/config.rs
use crate::event::Category;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "campus-calendar";
pub const STORE_FILE_NAME: &str = "user_events.json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CIRCLE_COLLECTION: &str = "https://firestore.googleapis.com/v1/projects/circle-calendar-kaihatu/databases/(default)/documents/event";
const JOB_HUNTING_COLLECTION: &str = "https://firestore.googleapis.com/v1/projects/jobhuntingevents/databases/(default)/documents/event";
const UNIVERSITY_COLLECTION: &str = "https://firestore.googleapis.com/v1/projects/universityevents-c12a1/databases/(default)/documents/event";

/// One remote source: the category it feeds and its event collection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub category: Category,
    pub collection_url: String,
}

impl SourceConfig {
    pub fn new(category: Category, collection_url: impl Into<String>) -> Self {
        Self { category, collection_url: collection_url.into() }
    }

    /// `.../databases/(default)/documents/event` -> `.../databases/(default)/documents:runQuery`
    pub fn query_endpoint(&self) -> String {
        let root = self.collection_url.split("/documents").next().unwrap_or(self.collection_url.as_str());
        format!("{}/documents:runQuery", root)
    }
}

pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(Category::Circle, CIRCLE_COLLECTION),
        SourceConfig::new(Category::JobHunting, JOB_HUNTING_COLLECTION),
        SourceConfig::new(Category::University, UNIVERSITY_COLLECTION),
    ]
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<SourceConfig>,
    pub store_path: PathBuf,
    pub request_timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            store_path: default_store_path(),
            request_timeout: DEFAULT_TIMEOUT,
            log_file: None,
            log_level: LevelFilter::Info,
        }
    }
}

/// `<data dir>/campus-calendar/user_events.json`, or the working directory
/// when the platform has no data dir.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME).join(STORE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(STORE_FILE_NAME))
}
