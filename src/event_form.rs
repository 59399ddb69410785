// src/event_form.rs
use crate::errors::ValidationError;
use crate::event::{Category, Event};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Rank given to every event the user creates.
pub const USER_EVENT_PRIORITY: f64 = 50.0;

/// Type used when the user leaves the type blank ("personal").
pub const DEFAULT_USER_TYPE: &str = "個人";

/// Raw input of the event creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, midnight when absent
    pub time: Option<String>,
    pub location: String,
    pub event_type: String,
    pub description: String,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self { title: title.into(), date: date.into(), ..Self::default() }
    }

    /// Validates the input and builds the personal event it describes.
    /// `now` supplies the id.
    pub fn into_event(self, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }

        let date_input = self.date.trim();
        if date_input.is_empty() {
            return Err(ValidationError::MissingField("date"));
        }
        let date = NaiveDate::parse_from_str(date_input, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date_input.to_string()))?;

        let time = match self.time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
                .map_err(|_| ValidationError::InvalidTime(raw.to_string()))?,
            None => NaiveTime::default(),
        };

        // Local wall time without offset, the way the web client stored it.
        let date_time = date.and_time(time).format("%Y-%m-%dT%H:%M:%S").to_string();
        let event_type = match self.event_type.trim() {
            "" => DEFAULT_USER_TYPE,
            given => given,
        };

        let mut event = Event::new(
            format!("user-{}", now.timestamp_millis()),
            title.to_string(),
            date_time,
            Category::Personal,
        )
        .with_type(event_type)
        .with_priority(USER_EVENT_PRIORITY);

        if !self.location.trim().is_empty() {
            event = event.with_location(self.location.trim());
        }
        if !self.description.trim().is_empty() {
            event = event.with_description(self.description.trim());
        }
        Ok(event)
    }
}
