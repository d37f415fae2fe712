// Source trait for telemetry snapshots
use crate::domain::alert::EventLogItem;
use crate::domain::entity::MonitoredEntity;
use crate::domain::motor::MotorNode;
use crate::domain::telemetry::{ChartPoint, CuttingTelemetry, HistorySample, HydraulicTelemetry, MetricCard};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Current snapshot of every sensor
    async fn list_sensors(&self) -> anyhow::Result<Vec<MonitoredEntity>>;

    /// A single sensor, `None` when the id is unknown
    async fn sensor(&self, id: &str) -> anyhow::Result<Option<MonitoredEntity>>;

    /// Samples for one sensor in `[from, to)`, one per `step`
    async fn sensor_history(
        &self,
        id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        step: Duration,
    ) -> anyhow::Result<Vec<HistorySample>>;

    async fn cutting_snapshot(&self) -> anyhow::Result<CuttingTelemetry>;

    async fn hydraulic_snapshot(&self) -> anyhow::Result<HydraulicTelemetry>;

    /// Event log, newest first
    async fn events(&self) -> anyhow::Result<Vec<EventLogItem>>;

    async fn dashboard_metrics(&self) -> anyhow::Result<Vec<MetricCard>>;

    /// Sliding window of the live dashboard chart, oldest first
    async fn chart_window(&self) -> anyhow::Result<Vec<ChartPoint>>;

    /// Drive motors on the machine plan
    async fn motor_nodes(&self) -> anyhow::Result<Vec<MotorNode>>;
}
