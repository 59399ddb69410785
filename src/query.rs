// src/query.rs
//! Wire types for the document database `:runQuery` endpoint each remote
//! source exposes. Only the subset this client sends and reads is modelled.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const EVENT_COLLECTION: &str = "event";
pub const DATE_FIELD: &str = "date";

// ===== request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where")]
    pub filter: Filter,
    pub order_by: Vec<Order>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub composite_filter: CompositeFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositeFilter {
    pub op: CompositeOperator,
    pub filters: Vec<FieldFilterEntry>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeOperator {
    And,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilterEntry {
    pub field_filter: FieldFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOperator,
    pub value: TimestampValue,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOperator {
    GreaterThanOrEqual,
    LessThanOrEqual,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampValue {
    pub timestamp_value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub field: FieldReference,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
}

impl RunQueryRequest {
    /// `date >= start AND date <= end`, ascending by date.
    pub fn date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let bound = |op: FieldOperator, at: DateTime<Utc>| FieldFilterEntry {
            field_filter: FieldFilter {
                field: date_field(),
                op,
                value: TimestampValue { timestamp_value: format_timestamp(at) },
            },
        };

        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector { collection_id: EVENT_COLLECTION.to_string() }],
                filter: Filter {
                    composite_filter: CompositeFilter {
                        op: CompositeOperator::And,
                        filters: vec![
                            bound(FieldOperator::GreaterThanOrEqual, start),
                            bound(FieldOperator::LessThanOrEqual, end),
                        ],
                    },
                },
                order_by: vec![Order { field: date_field(), direction: Direction::Ascending }],
            },
        }
    }
}

fn date_field() -> FieldReference {
    FieldReference { field_path: DATE_FIELD.to_string() }
}

/// Second precision with a `Z` suffix, e.g. `2024-03-01T00:00:00Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ===== response
/// One element of the JSON array the endpoint returns. Elements that only
/// carry bookkeeping (e.g. `readTime`) have no document.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponseItem {
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Full resource path; the last segment is the document id.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(self.name.as_str())
    }

    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.string_value.as_deref())
    }

    pub fn timestamp_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.timestamp_value.as_deref())
    }

    /// Integer values win over doubles, mirroring how the sources encode ranks.
    pub fn number_field(&self, key: &str) -> Option<f64> {
        let value = self.fields.get(key)?;
        value.integer_value.as_ref().and_then(IntegerValue::as_f64).or(value.double_value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub integer_value: Option<IntegerValue>,
    #[serde(default)]
    pub double_value: Option<f64>,
    #[serde(default)]
    pub timestamp_value: Option<String>,
}

/// 64-bit integers travel as strings on the wire; plain numbers are tolerated.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntegerValue {
    Text(String),
    Number(i64),
}

impl IntegerValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IntegerValue::Text(s) => s.trim().parse::<i64>().ok().map(|n| n as f64),
            IntegerValue::Number(n) => Some(*n as f64),
        }
    }
}
