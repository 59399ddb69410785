// src/event_factory.rs
use crate::event::{Category, Event, parse_event_date};
use crate::query::{Document, QueryResponseItem, format_timestamp};
use chrono::{DateTime, Utc};
use log::{debug, warn};

const UNTITLED: &str = "Untitled";

/// Turns one source's query response into events of that source's category.
pub struct EventFactory {
    category: Category,
    fallback_date: DateTime<Utc>,
}

impl EventFactory {
    pub fn new(category: Category) -> Self {
        Self { category, fallback_date: Utc::now() }
    }

    // Builder methods
    /// The instant given to records whose `date` is missing or unreadable.
    pub fn with_fallback_date(mut self, fallback_date: DateTime<Utc>) -> Self {
        self.fallback_date = fallback_date;
        self
    }

    pub fn create_events(&self, items: Vec<QueryResponseItem>) -> Vec<Event> {
        let total = items.len();
        let events: Vec<Event> = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|document| self.create_event(&document))
            .collect();
        debug!(
            "EventFactory({}): {} events from {} response items",
            self.category,
            events.len(),
            total
        );
        events
    }

    fn create_event(&self, document: &Document) -> Event {
        let text = |key: &str| document.string_field(key).unwrap_or_default().to_string();

        let title = document
            .string_field("title")
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED)
            .to_string();

        Event::new(document.id().to_string(), title, self.date_of(document), self.category)
            .with_description(text("description"))
            .with_location(text("location"))
            .with_company(text("company"))
            .with_type(text("type"))
            .with_url(text("url"))
            .with_priority(document.number_field("priority").unwrap_or(0.0))
    }

    // Malformed records are kept and dated "now" rather than dropped.
    fn date_of(&self, document: &Document) -> String {
        match document.timestamp_field("date") {
            Some(raw) if parse_event_date(raw, &Utc).is_some() => raw.to_string(),
            Some(raw) => {
                warn!(
                    "EventFactory({}): document {} has unreadable date '{}', using fallback",
                    self.category,
                    document.id(),
                    raw
                );
                format_timestamp(self.fallback_date)
            }
            None => {
                warn!(
                    "EventFactory({}): document {} has no date, using fallback",
                    self.category,
                    document.id()
                );
                format_timestamp(self.fallback_date)
            }
        }
    }
}
