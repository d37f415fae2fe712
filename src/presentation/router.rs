// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    alert_feed, cutting_telemetry, dashboard_chart, dashboard_metrics, get_sensor, get_theme, health_check,
    hydraulic_telemetry, list_events, list_sensors, list_thresholds, motor_nodes, motor_zones, put_theme,
    sensor_alerts, sensor_history, sensor_summary, stream_topic,
};
use crate::presentation::ws::ws_handler;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// JSON bodies are compressed by the handlers themselves, so no CompressionLayer here
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/summary", get(sensor_summary))
        .route("/api/sensors/alerts", get(sensor_alerts))
        .route("/api/sensors/:id", get(get_sensor))
        .route("/api/sensors/:id/history", get(sensor_history))
        .route("/api/cutting/telemetry", get(cutting_telemetry))
        .route("/api/hydraulic/telemetry", get(hydraulic_telemetry))
        .route("/api/dashboard/metrics", get(dashboard_metrics))
        .route("/api/dashboard/chart", get(dashboard_chart))
        .route("/api/motors/nodes", get(motor_nodes))
        .route("/api/motors/zones", get(motor_zones))
        .route("/api/events", get(list_events))
        .route("/api/alerts", get(alert_feed))
        .route("/api/thresholds", get(list_thresholds))
        .route("/api/preferences/theme", get(get_theme).put(put_theme))
        .route("/api/stream/:topic", get(stream_topic))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
