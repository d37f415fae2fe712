// Monitored entity domain model (sensors and their categorical status)
use crate::domain::error::StatusError;
use crate::domain::level::Level;
use crate::domain::threshold::ThresholdTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Categorical state assigned to an entity. Independent from [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "advertencia")]
    Warning,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "offline")]
    Offline,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Online, Status::Warning, Status::Error, Status::Offline];

    pub fn parse(raw: &str) -> Option<Status> {
        match raw {
            "online" => Some(Status::Online),
            "advertencia" => Some(Status::Warning),
            "error" => Some(Status::Error),
            "offline" => Some(Status::Offline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Online => "online",
            Status::Warning => "advertencia",
            Status::Error => "error",
            Status::Offline => "offline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Online => "En línea",
            Status::Warning => "Advertencia",
            Status::Error => "Error",
            Status::Offline => "Sin conexión",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Status::Warning | Status::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Presion,
    Temperatura,
    Posicion,
    Rotacion,
    Caudal,
    Gas,
}

impl SensorKind {
    pub fn parse(raw: &str) -> Option<SensorKind> {
        match raw {
            "presion" => Some(SensorKind::Presion),
            "temperatura" => Some(SensorKind::Temperatura),
            "posicion" => Some(SensorKind::Posicion),
            "rotacion" => Some(SensorKind::Rotacion),
            "caudal" => Some(SensorKind::Caudal),
            "gas" => Some(SensorKind::Gas),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredEntity {
    pub id: String,
    pub title: String,
    pub value: f64,
    pub units: String,
    #[serde(rename = "type")]
    pub kind: SensorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    /// Raw status string. Kept unparsed so unknown states are visible to
    /// the aggregator instead of failing deserialization.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonitoredEntity {
    pub fn new(id: &str, title: &str, value: f64, units: &str, kind: SensorKind, status: Status) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            value,
            units: units.to_string(),
            kind,
            metric_type: None,
            status: status.as_str().to_string(),
            updated_at: None,
        }
    }

    pub fn with_metric(mut self, metric_id: &str) -> Self {
        self.metric_type = Some(metric_id.to_string());
        self
    }

    pub fn status(&self) -> Option<Status> {
        Status::parse(&self.status)
    }

    pub fn is_alert(&self) -> bool {
        self.status().is_some_and(|s| s.is_alert())
    }

    /// Threshold level of the current value. Entities without a metric are `Ok`.
    pub fn level(&self, table: &ThresholdTable) -> Result<Level, StatusError> {
        match &self.metric_type {
            Some(metric_id) => table.classify_metric(metric_id, self.value),
            None => Ok(Level::Ok),
        }
    }

    /// Merge a partial update into this entity.
    pub fn apply(&mut self, delta: &SensorDelta) {
        self.value = delta.value;
        if let Some(status) = &delta.status {
            self.status = status.clone();
        }
        self.updated_at = Some(delta.updated_at);
    }
}

/// Partial update pushed for a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDelta {
    pub id: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Set of sensor kinds to show. Empty means every kind ("todos").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorFilter {
    kinds: BTreeSet<SensorKind>,
}

impl SensorFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(kinds: impl IntoIterator<Item = SensorKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Parse a comma separated list such as `presion,gas`. `todos` selects everything.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut kinds = BTreeSet::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part == "todos" {
                return Ok(Self::all());
            }
            let kind = SensorKind::parse(part).ok_or_else(|| format!("unknown sensor type '{}'", part))?;
            kinds.insert(kind);
        }
        Ok(Self { kinds })
    }

    pub fn matches(&self, entity: &MonitoredEntity) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&entity.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(status: &str) -> MonitoredEntity {
        let mut e = MonitoredEntity::new("s1", "Sensor", 1.0, "bar", SensorKind::Presion, Status::Online);
        e.status = status.to_string();
        e
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::Warning).unwrap(), "\"advertencia\"");
        for status in Status::ALL {
            assert_eq!(Status::parse(status.as_str()), Some(status));
        }
        assert_eq!(Status::parse("maintenance"), None);
    }

    #[test]
    fn test_alert_detection() {
        assert!(sensor("advertencia").is_alert());
        assert!(sensor("error").is_alert());
        assert!(!sensor("online").is_alert());
        assert!(!sensor("offline").is_alert());
        assert!(!sensor("unknown").is_alert());
    }

    #[test]
    fn test_level_without_metric_is_ok() {
        let table = ThresholdTable::builtin();
        let e = sensor("online");
        assert_eq!(e.level(&table), Ok(Level::Ok));

        let e = sensor("online").with_metric("hydraulic.temp_out");
        let e = MonitoredEntity { value: 95.0, ..e };
        assert_eq!(e.level(&table), Ok(Level::Crit));

        let e = sensor("online").with_metric("missing.metric");
        assert!(matches!(e.level(&table), Err(StatusError::Configuration { .. })));
    }

    #[test]
    fn test_unknown_status_survives_deserialization() {
        let json = r#"{"id":"x","title":"X","value":1.5,"units":"bar","type":"presion","status":"calibrating"}"#;
        let e: MonitoredEntity = serde_json::from_str(json).unwrap();
        assert_eq!(e.status(), None);
        assert_eq!(e.kind, SensorKind::Presion);
    }

    #[test]
    fn test_apply_delta() {
        let mut e = sensor("online");
        let now = Utc::now();
        e.apply(&SensorDelta {
            id: "s1".to_string(),
            value: 7.5,
            status: None,
            updated_at: now,
        });
        assert_eq!(e.value, 7.5);
        assert_eq!(e.status(), Some(Status::Online));
        assert_eq!(e.updated_at, Some(now));

        e.apply(&SensorDelta {
            id: "s1".to_string(),
            value: 9.0,
            status: Some("error".to_string()),
            updated_at: now,
        });
        assert_eq!(e.status(), Some(Status::Error));
    }

    #[test]
    fn test_sensor_filter() {
        let gas = MonitoredEntity::new("g", "CH4", 1200.0, "ppm", SensorKind::Gas, Status::Error);
        let temp = MonitoredEntity::new("t", "Oil", 75.0, "°C", SensorKind::Temperatura, Status::Warning);

        let filter = SensorFilter::parse("gas, presion").unwrap();
        assert!(filter.matches(&gas));
        assert!(!filter.matches(&temp));

        let filter = SensorFilter::parse("gas,todos").unwrap();
        assert!(filter.matches(&temp));

        assert!(SensorFilter::parse("").unwrap().matches(&temp));
        assert!(SensorFilter::parse("sonar").is_err());
    }
}
