// Status service - Threshold-driven views of the cutting and hydraulic subsystems
use crate::application::aggregator::{merge_alerts, sensor_alerts};
use crate::application::error::ServiceError;
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::alert::{
    available_categories, filter_by_categories, AlertCategory, AlertItem, EventLogItem,
};
use crate::domain::dashboard::Dashboard;
use crate::domain::error::StatusError;
use crate::domain::level::{worst_level, Level};
use crate::domain::motor::{summarize_zones, MotorNode, ZoneSummary};
use crate::domain::telemetry::{CuttingTelemetry, HydraulicTelemetry, MetricReading};
use crate::domain::threshold::ThresholdTable;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

const SPIN_SLOWDOWN: f64 = 4.0;
const SPIN_MIN_PERIOD_SECS: f64 = 8.0;

#[derive(Debug, Clone, Serialize)]
pub struct SubsystemStatus<T> {
    pub snapshot: T,
    pub readings: Vec<MetricReading>,
    pub worst: Level,
    /// Derived figures specific to the subsystem
    pub derived: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertFeed {
    pub items: Vec<AlertItem>,
    /// Item count before category filtering
    pub total: usize,
    pub available: Vec<AlertCategory>,
}

#[derive(Clone)]
pub struct StatusService {
    source: Arc<dyn TelemetrySource>,
    thresholds: Arc<ThresholdTable>,
}

impl StatusService {
    pub fn new(source: Arc<dyn TelemetrySource>, thresholds: Arc<ThresholdTable>) -> Self {
        Self { source, thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    fn classify_all(&self, readings: &[(&'static str, f64)]) -> Result<Vec<MetricReading>, StatusError> {
        readings
            .iter()
            .map(|&(metric_id, value)| {
                let threshold = self.thresholds.get(metric_id)?;
                let level = self.thresholds.classify_metric(metric_id, value)?;
                Ok(MetricReading {
                    metric_id: metric_id.to_string(),
                    value,
                    level,
                    fraction: threshold.fraction_of_scale(value),
                })
            })
            .collect()
    }

    pub async fn cutting(&self) -> Result<SubsystemStatus<CuttingTelemetry>, ServiceError> {
        let snapshot = self.source.cutting_snapshot().await?;
        let readings = self.classify_all(&snapshot.readings())?;
        let worst = worst_level(readings.iter().map(|r| r.level));

        let mut derived = serde_json::Map::new();
        derived.insert(
            "spin_period_secs".to_string(),
            snapshot.spin_period_secs(SPIN_SLOWDOWN, SPIN_MIN_PERIOD_SECS).into(),
        );

        Ok(SubsystemStatus {
            snapshot,
            readings,
            worst,
            derived,
        })
    }

    pub async fn hydraulic(&self) -> Result<SubsystemStatus<HydraulicTelemetry>, ServiceError> {
        let snapshot = self.source.hydraulic_snapshot().await?;
        let readings = self.classify_all(&snapshot.readings())?;
        let worst = worst_level(readings.iter().map(|r| r.level));

        let mut derived = serde_json::Map::new();
        derived.insert("pressure_delta".to_string(), snapshot.pressure_delta().into());
        derived.insert("temperature_delta".to_string(), snapshot.temperature_delta().into());
        let stored: f64 = snapshot.tanks.iter().map(|t| t.volume_l()).sum();
        derived.insert("oil_volume_l".to_string(), stored.into());

        Ok(SubsystemStatus {
            snapshot,
            readings,
            worst,
            derived,
        })
    }

    pub async fn events(&self) -> Result<Vec<EventLogItem>, ServiceError> {
        Ok(self.source.events().await?)
    }

    /// Sensor alerts and log events in one feed, newest first.
    pub async fn alert_feed(&self, categories: &[AlertCategory]) -> Result<AlertFeed, ServiceError> {
        let sensors = self.source.list_sensors().await?;
        let events = self.source.events().await?;

        let all = merge_alerts(sensor_alerts(&sensors, Utc::now()), &events)?;
        let total = all.len();
        let available = available_categories(&all);
        let items = filter_by_categories(all, categories);

        Ok(AlertFeed {
            items,
            total,
            available,
        })
    }

    pub async fn dashboard(&self) -> Result<Dashboard, ServiceError> {
        let cards = self.source.dashboard_metrics().await?;
        let chart = self.source.chart_window().await?;
        Ok(Dashboard::new("Dashboard".to_string(), cards, chart))
    }

    pub async fn motor_nodes(&self) -> Result<Vec<MotorNode>, ServiceError> {
        Ok(self.source.motor_nodes().await?)
    }

    /// Per-zone motor counts and worst level, front to rear.
    pub async fn motor_zones(&self) -> Result<Vec<ZoneSummary>, ServiceError> {
        let nodes = self.source.motor_nodes().await?;
        Ok(summarize_zones(&nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{MonitoredEntity, SensorKind, Status};
    use crate::domain::threshold::MetricThreshold;
    use crate::infrastructure::mock_store::MockTelemetryStore;

    fn service() -> StatusService {
        let store = Arc::new(MockTelemetryStore::demo(Utc::now()));
        StatusService::new(store, Arc::new(ThresholdTable::builtin()))
    }

    #[tokio::test]
    async fn test_cutting_status() {
        let status = service().cutting().await.unwrap();
        assert_eq!(status.readings.len(), 8);
        // Demo cutting head runs inside every band
        assert_eq!(status.worst, Level::Ok);

        let spin = status.derived["spin_period_secs"].as_f64().unwrap();
        assert!((spin - 4.0 * 60.0 / 14.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_hydraulic_status_with_tighter_table() {
        let store = Arc::new(MockTelemetryStore::demo(Utc::now()));
        let table = ThresholdTable::builtin()
            .with_overrides(vec![MetricThreshold::new("hydraulic.temp_out", 40.0, 45.0, false, 100.0)])
            .unwrap();
        let service = StatusService::new(store, Arc::new(table));

        let status = service.hydraulic().await.unwrap();
        let outlet = status
            .readings
            .iter()
            .find(|r| r.metric_id == "hydraulic.temp_out")
            .unwrap();
        assert_eq!(outlet.level, Level::Crit);
        assert_eq!(status.worst, Level::Crit);
        assert!((status.derived["pressure_delta"].as_f64().unwrap() - 48.8).abs() < 1e-9);
        assert_eq!(status.derived["oil_volume_l"].as_f64().unwrap(), 1550.0);
    }

    #[tokio::test]
    async fn test_missing_threshold_surfaces_configuration_error() {
        let store = Arc::new(MockTelemetryStore::demo(Utc::now()));
        let table = ThresholdTable::new(vec![MetricThreshold::new("cutting.rpm", 16.0, 20.0, false, 24.0)]).unwrap();
        let service = StatusService::new(store, Arc::new(table));

        let err = service.cutting().await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Status(StatusError::Configuration { ref metric_id }) if metric_id == "cutting.torque"
        ));
    }

    #[tokio::test]
    async fn test_alert_feed() {
        let store = Arc::new(MockTelemetryStore::with_sensors(vec![
            MonitoredEntity::new("ch4", "Metano", 1200.0, "ppm", SensorKind::Gas, Status::Error),
            MonitoredEntity::new("o2", "Oxígeno", 20.9, "%", SensorKind::Gas, Status::Online),
        ]));
        let service = StatusService::new(store, Arc::new(ThresholdTable::builtin()));

        let feed = service.alert_feed(&[]).await.unwrap();
        assert_eq!(feed.total, 16);
        assert_eq!(feed.items.len(), 16);
        // The live sensor alert is stamped now, after every demo event
        assert_eq!(feed.items[0].id(), "sensor-ch4");
        assert_eq!(feed.available.len(), 4);

        let errors = service
            .alert_feed(&[AlertCategory::EventError])
            .await
            .unwrap();
        assert_eq!(errors.total, 16);
        assert_eq!(errors.items.len(), 3);
        assert!(errors.items.iter().all(|i| i.category() == AlertCategory::EventError));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let dashboard = service().dashboard().await.unwrap();
        assert_eq!(dashboard.tiles.len(), 4);
        assert_eq!(dashboard.chart.len(), 10);
        assert_eq!(dashboard.tiles[2].percent.round(), 54.0);
    }

    #[tokio::test]
    async fn test_motor_zones() {
        let service = service();
        assert_eq!(service.motor_nodes().await.unwrap().len(), 7);

        let zones = service.motor_zones().await.unwrap();
        let worst: Vec<Level> = zones.iter().map(|z| z.worst).collect();
        assert_eq!(worst, vec![Level::Crit, Level::Ok, Level::Ok]);
        assert_eq!(zones[0].nodes, 4);
        assert_eq!(zones[0].counts.error, 2);
        assert_eq!(zones[0].counts.warn, 1);
        assert_eq!(zones[1].counts.ok, 2);
        assert_eq!(zones[2].nodes, 1);
    }
}
