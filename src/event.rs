// src/event.rs
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// === CATEGORY ===
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Circle,
    JobHunting,
    University,
    /// Reserved for events created locally by the user.
    Personal,
}

impl Category {
    pub const ALL: [Category; 4] =
        [Category::Circle, Category::JobHunting, Category::University, Category::Personal];

    /// Categories backed by a remote source.
    pub const REMOTE: [Category; 3] = [Category::Circle, Category::JobHunting, Category::University];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Circle => "circle",
            Category::JobHunting => "jobHunting",
            Category::University => "university",
            Category::Personal => "personal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Circle => "Circle",
            Category::JobHunting => "Job hunting",
            Category::University => "University",
            Category::Personal => "Personal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

// === EVENT ===
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "id")]
    id: String,
    #[serde(rename = "title")]
    title: String,
    /// ISO-8601 timestamp, with or without an offset.
    #[serde(rename = "date")]
    date: String,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "location", default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(rename = "company", default, skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    event_type: Option<String>,
    #[serde(rename = "category")]
    category: Category,
    #[serde(rename = "priority", default, skip_serializing_if = "Option::is_none")]
    priority: Option<f64>,
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl Event {
    pub fn new(id: String, title: String, date: String, category: Category) -> Self {
        Self {
            id,
            title,
            date,
            description: None,
            location: None,
            company: None,
            event_type: None,
            category,
            priority: None,
            url: None,
        }
    }

    // Builder methods
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    // Accessor methods

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identity within a combined list. Remote and local events never share a
    /// category, so the pair keeps the two id spaces apart.
    pub fn key(&self) -> (Category, &str) {
        (self.category, &self.id)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    pub fn location(&self) -> Option<&str> {
        non_empty(self.location.as_deref())
    }

    pub fn company(&self) -> Option<&str> {
        non_empty(self.company.as_deref())
    }

    /// The facet value; an empty string counts as no type.
    pub fn event_type(&self) -> Option<&str> {
        non_empty(self.event_type.as_deref())
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn priority(&self) -> f64 {
        self.priority.unwrap_or(0.0)
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    /// The instant of the event in `tz`, or `None` if `date` is unreadable.
    pub fn starts_at_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        parse_event_date(&self.date, tz)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Accepts RFC 3339 timestamps and offset-less local wall times such as
/// `2024-03-20T09:30:00` (how locally created events are stored).
pub fn parse_event_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(tz));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| resolve_local(tz, naive))
}

/// Wall times skipped by a daylight-saving jump resolve to the same wall
/// time one hour later, past the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title    : {}", self.title)?;
        writeln!(f, "Date     : {}", self.date)?;
        writeln!(f, "Category : {}", self.category.label())?;
        if let Some(event_type) = self.event_type() {
            writeln!(f, "Type     : {}", event_type)?;
        }
        if let Some(location) = self.location() {
            writeln!(f, "Location : {}", location)?;
        }
        if let Some(company) = self.company() {
            writeln!(f, "Company  : {}", company)?;
        }
        if let Some(url) = self.url() {
            writeln!(f, "URL      : {}", url)?;
        }
        if let Some(description) = self.description() {
            writeln!(f, "Details  : {}", description)?;
        }
        write!(f, "ID       : {}", self.id)
    }
}
