// src/session.rs
use crate::config::Config;
use crate::errors::SessionError;
use crate::event::Event;
use crate::event_download::{EventAggregator, HttpSourceFetcher};
use crate::event_form::NewEvent;
use crate::filter::{CategoryFilter, FacetMap, apply_filters, derive_facets};
use crate::grid::{DayCell, build_grid, first_of_month, month_bounds};
use crate::user_store::{EventStore, JsonFileStore};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

/// Everything loaded for one month: remote events followed by the user's own
/// events of that month, and the facets derived from them.
#[derive(Debug, Clone)]
pub struct MonthSnapshot {
    reference: NaiveDate,
    events: Vec<Event>,
    facets: FacetMap,
}

impl MonthSnapshot {
    pub fn new(reference: NaiveDate, events: Vec<Event>) -> Self {
        let facets = derive_facets(&events);
        Self { reference: first_of_month(reference), events, facets }
    }

    /// First day of the loaded month.
    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn facets(&self) -> &FacetMap {
        &self.facets
    }

    pub fn contains(&self, event: &Event) -> bool {
        in_month(event, self.reference)
    }

    /// Adds a freshly created event if it belongs to this month.
    pub fn push_event(&mut self, event: Event) -> bool {
        if !self.contains(&event) {
            return false;
        }
        self.events.push(event);
        self.facets = derive_facets(&self.events);
        true
    }

    pub fn visible(&self, active: CategoryFilter, selected_types: &[String]) -> Vec<Event> {
        apply_filters(&self.events, active, selected_types)
    }

    pub fn grid(&self, active: CategoryFilter, selected_types: &[String]) -> Vec<DayCell> {
        build_grid(self.reference, &self.visible(active, selected_types))
    }
}

fn in_month(event: &Event, reference: NaiveDate) -> bool {
    event
        .starts_at_in(&Local)
        .is_some_and(|at| at.year() == reference.year() && at.month() == reference.month())
}

pub struct CalendarSession {
    aggregator: EventAggregator,
    store: Arc<dyn EventStore>,
}

impl CalendarSession {
    pub fn new(aggregator: EventAggregator, store: Arc<dyn EventStore>) -> Self {
        Self { aggregator, store }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let fetcher = Arc::new(HttpSourceFetcher::new(config.request_timeout)?);
        let aggregator = EventAggregator::new(fetcher, config.sources.clone());
        let store = Arc::new(JsonFileStore::new(config.store_path.clone()));
        Ok(Self::new(aggregator, store))
    }

    /// Never fails: unreachable sources and unreadable local data both just
    /// mean fewer events.
    pub async fn load_month(&self, reference: NaiveDate) -> MonthSnapshot {
        let (start, end) = month_bounds(reference);
        info!("CalendarSession: loading {}", first_of_month(reference).format("%Y-%m"));

        // The store does blocking file I/O, so it is read off the runtime
        // thread while the remote queries are in flight.
        let store = Arc::clone(&self.store);
        let (mut events, stored) = tokio::join!(
            self.aggregator.fetch_events(start, end),
            tokio::task::spawn_blocking(move || store.load_user_events()),
        );
        let stored: Vec<Event> = stored.unwrap_or_else(|e| {
            warn!("CalendarSession: loading user events failed: {}", e);
            Vec::new()
        });
        let user_events: Vec<Event> =
            stored.into_iter().filter(|event| in_month(event, reference)).collect();
        debug!("CalendarSession: {} remote, {} user events", events.len(), user_events.len());
        events.extend(user_events);

        MonthSnapshot::new(reference, events)
    }

    pub fn add_event(&self, input: NewEvent, now: DateTime<Utc>) -> Result<Event, SessionError> {
        let event = input.into_event(now)?;
        self.store.save_user_event(&event)?;
        info!("CalendarSession: added '{}' on {}", event.title(), event.date());
        Ok(event)
    }
}
