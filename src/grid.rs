// src/grid.rs
use crate::event::Event;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use log::warn;
use std::collections::HashMap;

/// One grid position. Padding cells before the first of the month have
/// `in_month == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    /// Every event of the day, highest priority first.
    pub events: Vec<Event>,
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    // 31 days past the 1st always lands in the following month.
    first_of_month(first_of_month(date) + Duration::days(31))
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_next_month(date) - Duration::days(1)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    last_of_month(date).day()
}

/// First day of the month `delta` months away from `date`'s month.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let mut month = first_of_month(date);
    for _ in 0..delta.unsigned_abs() {
        month = if delta > 0 {
            first_of_next_month(month)
        } else {
            first_of_month(month - Duration::days(1))
        };
    }
    month
}

/// `[1st 00:00:00, last 23:59:59]` of `reference`'s month as UTC wall clock.
pub fn month_bounds(reference: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = first_of_month(reference).and_time(NaiveTime::default());
    let end = first_of_next_month(reference).and_time(NaiveTime::default()) - Duration::seconds(1);
    (Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
}

/// Grid for `reference`'s month with events bucketed by their local date.
pub fn build_grid(reference: NaiveDate, events: &[Event]) -> Vec<DayCell> {
    build_grid_in(reference, events, &Local)
}

/// Weeks start on Sunday. The grid is the leading padding plus one cell per
/// day; the last week is not filled up.
pub fn build_grid_in<Tz: TimeZone>(reference: NaiveDate, events: &[Event], tz: &Tz) -> Vec<DayCell> {
    let first = first_of_month(reference);
    let padding = i64::from(first.weekday().num_days_from_sunday());
    let days = i64::from(days_in_month(reference));

    let mut buckets: HashMap<NaiveDate, Vec<Event>> = HashMap::new();
    for event in events {
        match event.starts_at_in(tz) {
            Some(starts_at) => buckets.entry(starts_at.date_naive()).or_default().push(event.clone()),
            None => warn!("build_grid: skipping '{}' with unreadable date '{}'", event.id(), event.date()),
        }
    }

    (-padding..days)
        .map(|offset| {
            let date = first + Duration::days(offset);
            let mut day_events = buckets.remove(&date).unwrap_or_default();
            // Stable, so equal priorities keep their input order.
            day_events.sort_by(|a, b| b.priority().total_cmp(&a.priority()));
            DayCell { date, in_month: offset >= 0, events: day_events }
        })
        .collect()
}
