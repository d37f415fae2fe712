// Alert aggregation - counts, alert filtering and merged alert feeds
use crate::domain::alert::{parse_alert_timestamp, AlertItem, EventAlert, EventLogItem, SensorAlert};
use crate::domain::entity::{MonitoredEntity, Status};
use crate::domain::error::StatusError;
use crate::domain::level::{worst_level, Level};
use crate::domain::threshold::ThresholdTable;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use std::cmp::Reverse;

/// Number of entities per recognized status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub online: usize,
    pub advertencia: usize,
    pub error: usize,
    pub offline: usize,
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Online => self.online,
            Status::Warning => self.advertencia,
            Status::Error => self.error,
            Status::Offline => self.offline,
        }
    }

    fn bump(&mut self, status: Status) {
        match status {
            Status::Online => self.online += 1,
            Status::Warning => self.advertencia += 1,
            Status::Error => self.error += 1,
            Status::Offline => self.offline += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.online + self.advertencia + self.error + self.offline
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub counts: StatusCounts,
    pub alert_count: usize,
    /// Entities whose status matched none of the four known values.
    /// They are not part of `counts`.
    pub unrecognized: usize,
    pub worst: Level,
}

/// Count entities per status. Unrecognized statuses are dropped.
pub fn count_by_status(entities: &[MonitoredEntity]) -> StatusCounts {
    count_with(entities, MonitoredEntity::status).0
}

fn count_with<T, S>(items: &[T], status_of: S) -> (StatusCounts, usize)
where
    S: Fn(&T) -> Option<Status>,
{
    let mut counts = StatusCounts::default();
    let mut unrecognized = 0;
    for item in items {
        match status_of(item) {
            Some(status) => counts.bump(status),
            None => unrecognized += 1,
        }
    }

    if unrecognized > 0 {
        tracing::warn!(unrecognized, "entities with unrecognized status left out of status counts");
    }

    (counts, unrecognized)
}

/// Entities in `advertencia` or `error`, in their original order.
pub fn filter_alerts(entities: &[MonitoredEntity]) -> Vec<MonitoredEntity> {
    entities.iter().filter(|e| e.is_alert()).cloned().collect()
}

/// Reduce a collection to status counts, alert count and worst level.
///
/// A failing level extractor aborts the aggregation with its error.
pub fn aggregate<T, S, L>(items: &[T], status_of: S, level_of: L) -> Result<Summary, StatusError>
where
    S: Fn(&T) -> Option<Status>,
    L: Fn(&T) -> Result<Level, StatusError>,
{
    let (counts, unrecognized) = count_with(items, &status_of);
    let levels = items.iter().map(&level_of).collect::<Result<Vec<_>, _>>()?;

    Ok(Summary {
        counts,
        alert_count: counts.advertencia + counts.error,
        unrecognized,
        worst: worst_level(levels),
    })
}

pub fn aggregate_entities(entities: &[MonitoredEntity], table: &ThresholdTable) -> Result<Summary, StatusError> {
    aggregate(entities, MonitoredEntity::status, |e| e.level(table))
}

/// Build the sensor side of the alert feed.
pub fn sensor_alerts(entities: &[MonitoredEntity], now: DateTime<Utc>) -> Vec<SensorAlert> {
    entities
        .iter()
        .filter_map(|e| {
            let status = e.status().filter(Status::is_alert)?;
            let at = e.updated_at.unwrap_or(now);
            Some(SensorAlert {
                id: format!("sensor-{}", e.id),
                sensor_id: e.id.clone(),
                title: e.title.clone(),
                description: format!("{} {}", e.value, e.units),
                status,
                timestamp: at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            })
        })
        .collect()
}

/// Merge sensor alerts and log events, newest first.
///
/// Equal timestamps keep concatenation order, so sensors come before events.
pub fn merge_alerts_on(
    reference_date: NaiveDate,
    sensor_alerts: Vec<SensorAlert>,
    events: &[EventLogItem],
) -> Result<Vec<AlertItem>, StatusError> {
    let items = sensor_alerts
        .into_iter()
        .map(AlertItem::Sensor)
        .chain(events.iter().map(|e| AlertItem::Event(EventAlert::from(e))));

    let mut keyed = items
        .map(|item| {
            let at = parse_alert_timestamp(item.timestamp(), reference_date)?;
            Ok((at, item))
        })
        .collect::<Result<Vec<_>, StatusError>>()?;

    // Vec::sort_by_key is stable
    keyed.sort_by_key(|(at, _)| Reverse(*at));

    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

pub fn merge_alerts(sensor_alerts: Vec<SensorAlert>, events: &[EventLogItem]) -> Result<Vec<AlertItem>, StatusError> {
    merge_alerts_on(Local::now().date_naive(), sensor_alerts, events)
}
