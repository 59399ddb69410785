// src/export.rs
use crate::errors::ExportError;
use crate::event::Event;
use chrono::{DateTime, Duration, Local, Utc};
use url::Url;

const CALENDAR_RENDER_URL: &str = "https://www.google.com/calendar/render";

/// Length given to exported events, which carry no end time of their own.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Deep link to the calendar service's "create event" page, prefilled with
/// the event's title, details, location and a one hour slot.
pub fn calendar_link(event: &Event) -> Result<Url, ExportError> {
    let starts_at: DateTime<Utc> = event
        .starts_at_in(&Local)
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ExportError::UnreadableDate {
            id: event.id().to_string(),
            date: event.date().to_string(),
        })?;
    let ends_at = starts_at + Duration::minutes(DEFAULT_DURATION_MINUTES);

    let mut url = Url::parse(CALENDAR_RENDER_URL)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("action", "TEMPLATE");
        query.append_pair("text", event.title());
        if let Some(details) = event.description() {
            query.append_pair("details", details);
        }
        if let Some(location) = event.location() {
            query.append_pair("location", location);
        }
        query.append_pair("dates", &format!("{}/{}", compact(starts_at), compact(ends_at)));
    }
    Ok(url)
}

/// `20240315T100000Z`
fn compact(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}
