// Sensor service - Use cases for the sensors view
use crate::application::aggregator::{aggregate_entities, filter_alerts, Summary};
use crate::application::error::{RangeError, ServiceError};
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::entity::{MonitoredEntity, SensorFilter};
use crate::domain::telemetry::HistorySample;
use crate::domain::threshold::ThresholdTable;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ALERT_LIMIT: usize = 50;
const MAX_HISTORY_POINTS: usize = 500;
const MAX_RAW_SAMPLES: u64 = 100_000;
const DEFAULT_HISTORY_SPAN_HOURS: i64 = 24;
const DEFAULT_HISTORY_STEP: Duration = Duration::from_secs(3600);

/// Raw `?from&to&interval` query of the history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub step: Duration,
}

impl HistoryQuery {
    /// Resolve defaults (last 24h, hourly) and validate the range.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<HistoryRange, RangeError> {
        let to = match &self.to {
            Some(raw) => parse_time(raw)?,
            None => now,
        };
        let from = match &self.from {
            Some(raw) => parse_time(raw)?,
            None => to - chrono::Duration::hours(DEFAULT_HISTORY_SPAN_HOURS),
        };
        let step = match &self.interval {
            Some(raw) => humantime::parse_duration(raw.trim())
                .map_err(|_| RangeError::MalformedInterval(raw.clone()))?,
            None => DEFAULT_HISTORY_STEP,
        };

        if from >= to {
            return Err(RangeError::Inverted);
        }
        if step.is_zero() {
            return Err(RangeError::ZeroStep);
        }
        // The first step past `from` must still be a valid timestamp
        let out_of_range = || RangeError::StepOutOfRange(humantime::format_duration(step).to_string());
        let step_delta = chrono::Duration::from_std(step).map_err(|_| out_of_range())?;
        if from.checked_add_signed(step_delta).is_none() {
            return Err(out_of_range());
        }

        let range = HistoryRange { from, to, step };
        let requested = range.sample_count();
        if requested > MAX_RAW_SAMPLES {
            return Err(RangeError::TooManySamples {
                requested,
                max: MAX_RAW_SAMPLES,
            });
        }
        Ok(range)
    }
}

impl HistoryRange {
    /// Number of samples in `[from, to)` at one per `step`.
    pub fn sample_count(&self) -> u64 {
        let span_ms = (self.to - self.from).num_milliseconds().max(0) as u128;
        let step_ms = self.step.as_millis().max(1);
        span_ms.div_ceil(step_ms) as u64
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, RangeError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RangeError::MalformedTime(raw.to_string()))
}

#[derive(Clone)]
pub struct SensorService {
    source: Arc<dyn TelemetrySource>,
    thresholds: Arc<ThresholdTable>,
}

impl SensorService {
    pub fn new(source: Arc<dyn TelemetrySource>, thresholds: Arc<ThresholdTable>) -> Self {
        Self { source, thresholds }
    }

    pub async fn list(&self, filter: &SensorFilter) -> Result<Vec<MonitoredEntity>, ServiceError> {
        let sensors = self.source.list_sensors().await?;
        Ok(sensors.into_iter().filter(|s| filter.matches(s)).collect())
    }

    pub async fn get(&self, id: &str) -> Result<MonitoredEntity, ServiceError> {
        self.source
            .sensor(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub async fn summary(&self) -> Result<Summary, ServiceError> {
        let sensors = self.source.list_sensors().await?;
        Ok(aggregate_entities(&sensors, &self.thresholds)?)
    }

    pub async fn alerts(&self, limit: Option<usize>) -> Result<Vec<MonitoredEntity>, ServiceError> {
        let sensors = self.source.list_sensors().await?;
        let mut alerts = filter_alerts(&sensors);
        alerts.truncate(limit.unwrap_or(DEFAULT_ALERT_LIMIT));
        Ok(alerts)
    }

    pub async fn history(&self, id: &str, query: &HistoryQuery) -> Result<Vec<HistorySample>, ServiceError> {
        let range = query.resolve(Utc::now())?;
        // 404 before doing any work for unknown ids
        self.get(id).await?;

        let samples = self
            .source
            .sensor_history(id, range.from, range.to, range.step)
            .await?;

        tracing::debug!(sensor_id = %id, samples = samples.len(), "sensor history fetched");
        Ok(downsample_samples(samples, MAX_HISTORY_POINTS))
    }
}

/// Downsample samples using bucket averaging
fn downsample_samples(samples: Vec<HistorySample>, max_points: usize) -> Vec<HistorySample> {
    if samples.is_empty() || max_points == 0 || samples.len() <= max_points {
        return samples;
    }

    let bucket_size = samples.len().div_ceil(max_points);

    samples
        .chunks(bucket_size)
        .map(|chunk| {
            // Middle sample's time, average value
            let mid = &chunk[chunk.len() / 2];
            let avg = chunk.iter().map(|s| s.value).sum::<f64>() / chunk.len() as f64;
            HistorySample::new(mid.time, avg)
        })
        .collect()
}
