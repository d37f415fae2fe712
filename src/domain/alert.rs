// Alert and event-log domain models
use crate::domain::entity::Status;
use crate::domain::error::StatusError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogItem {
    pub id: String,
    pub timestamp: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl EventLogItem {
    pub fn new(id: &str, timestamp: &str, description: &str, kind: EventKind) -> Self {
        Self {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            description: description.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorAlert {
    pub id: String,
    pub sensor_id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAlert {
    pub id: String,
    pub title: String,
    pub kind: EventKind,
    pub timestamp: String,
}

impl From<&EventLogItem> for EventAlert {
    fn from(event: &EventLogItem) -> Self {
        Self {
            id: format!("event-{}", event.id),
            title: event.description.clone(),
            kind: event.kind,
            timestamp: event.timestamp.clone(),
        }
    }
}

/// One row of the unified alerts-and-events feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum AlertItem {
    Sensor(SensorAlert),
    Event(EventAlert),
}

impl AlertItem {
    pub fn id(&self) -> &str {
        match self {
            AlertItem::Sensor(a) => &a.id,
            AlertItem::Event(e) => &e.id,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            AlertItem::Sensor(a) => &a.timestamp,
            AlertItem::Event(e) => &e.timestamp,
        }
    }

    pub fn category(&self) -> AlertCategory {
        match self {
            AlertItem::Sensor(a) if a.status == Status::Error => AlertCategory::SensorError,
            AlertItem::Sensor(_) => AlertCategory::SensorWarning,
            AlertItem::Event(e) => match e.kind {
                EventKind::Info => AlertCategory::EventInfo,
                EventKind::Warning => AlertCategory::EventWarning,
                EventKind::Error => AlertCategory::EventError,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertCategory {
    EventError,
    EventInfo,
    EventWarning,
    SensorError,
    SensorWarning,
}

impl AlertCategory {
    pub fn parse(raw: &str) -> Option<AlertCategory> {
        match raw {
            "sensor-error" => Some(AlertCategory::SensorError),
            "sensor-warning" => Some(AlertCategory::SensorWarning),
            "event-info" => Some(AlertCategory::EventInfo),
            "event-warning" => Some(AlertCategory::EventWarning),
            "event-error" => Some(AlertCategory::EventError),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertCategory::SensorError => "Sensor Error",
            AlertCategory::SensorWarning => "Sensor Advertencia",
            AlertCategory::EventError => "Evento Error",
            AlertCategory::EventWarning => "Evento Advertencia",
            AlertCategory::EventInfo => "Evento Info",
        }
    }
}

/// Keep items whose category is selected. An empty selection keeps everything.
pub fn filter_by_categories(items: Vec<AlertItem>, categories: &[AlertCategory]) -> Vec<AlertItem> {
    if categories.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| categories.contains(&item.category()))
        .collect()
}

/// Categories present in `items`, sorted and without repeats.
pub fn available_categories(items: &[AlertItem]) -> Vec<AlertCategory> {
    let mut categories: Vec<AlertCategory> = items.iter().map(AlertItem::category).collect();
    categories.sort();
    categories.dedup();
    categories
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y, %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y, %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Parse an alert timestamp.
///
/// Offset-bearing ISO timestamps are converted to local wall-clock time,
/// the same clock event-log entries are written in. Naive date-times
/// (ISO or `D/M/YYYY, HH:MM:SS` display strings) are taken as-is, and
/// time-only strings are placed on `reference_date`.
pub fn parse_alert_timestamp(raw: &str, reference_date: NaiveDate) -> Result<NaiveDateTime, StatusError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    for format in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, format) {
            return Ok(reference_date.and_time(t));
        }
    }

    Err(StatusError::MalformedTimestamp {
        raw: raw.to_string(),
    })
}
