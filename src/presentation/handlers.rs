// HTTP request handlers
use crate::application::channels::Topic;
use crate::application::sensor_service::HistoryQuery;
use crate::domain::alert::AlertCategory;
use crate::domain::entity::SensorFilter;
use crate::domain::threshold::MetricThreshold;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::theme_store::ThemePreference;
use crate::presentation::app_state::AppState;
use crate::presentation::error::{ApiError, ApiResult};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SensorsQuery {
    pub kinds: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeedQuery {
    pub categories: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: ThemePreference,
}

/// JSON body, Brotli-compressed when the client accepts it.
async fn respond<T: Serialize>(headers: &HeaderMap, data: &T) -> ApiResult<Response<Body>> {
    json_response(StatusCode::OK, data, accepts_brotli(headers))
        .await
        .map_err(|status| ApiError::Internal(anyhow::anyhow!("failed to encode response ({})", status)))
}

fn parse_categories(raw: Option<&str>) -> ApiResult<Vec<AlertCategory>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            AlertCategory::parse(s)
                .ok_or_else(|| ApiError::bad_request("invalid_category", format!("unknown alert category '{}'", s)))
        })
        .collect()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_sensors(
    headers: HeaderMap,
    Query(query): Query<SensorsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    let filter = match query.kinds.as_deref() {
        Some(raw) => SensorFilter::parse(raw).map_err(|e| ApiError::bad_request("invalid_filter", e))?,
        None => SensorFilter::all(),
    };
    let sensors = state.sensor_service.list(&filter).await?;
    respond(&headers, &sensors).await
}

pub async fn sensor_summary(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let summary = state.sensor_service.summary().await?;
    respond(&headers, &summary).await
}

pub async fn sensor_alerts(
    headers: HeaderMap,
    Query(query): Query<AlertsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    let alerts = state.sensor_service.alerts(query.limit).await?;
    respond(&headers, &alerts).await
}

pub async fn get_sensor(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    let sensor = state.sensor_service.get(&id).await?;
    respond(&headers, &sensor).await
}

pub async fn sensor_history(
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    let samples = state.sensor_service.history(&id, &query).await?;
    respond(&headers, &samples).await
}

pub async fn cutting_telemetry(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let status = state.status_service.cutting().await?;
    respond(&headers, &status).await
}

pub async fn hydraulic_telemetry(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let status = state.status_service.hydraulic().await?;
    respond(&headers, &status).await
}

pub async fn dashboard_metrics(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let dashboard = state.status_service.dashboard().await?;
    respond(&headers, &dashboard.tiles).await
}

pub async fn dashboard_chart(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let dashboard = state.status_service.dashboard().await?;
    respond(&headers, &dashboard.chart).await
}

pub async fn list_events(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let events = state.status_service.events().await?;
    respond(&headers, &events).await
}

pub async fn alert_feed(
    headers: HeaderMap,
    Query(query): Query<AlertFeedQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    let categories = parse_categories(query.categories.as_deref())?;
    let feed = state.status_service.alert_feed(&categories).await?;
    respond(&headers, &feed).await
}

pub async fn motor_nodes(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let nodes = state.status_service.motor_nodes().await?;
    respond(&headers, &nodes).await
}

pub async fn motor_zones(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let zones = state.status_service.motor_zones().await?;
    respond(&headers, &zones).await
}

pub async fn list_thresholds(headers: HeaderMap, State(state): State<Arc<AppState>>) -> ApiResult<Response<Body>> {
    let rows: Vec<MetricThreshold> = state.status_service.thresholds().rows().cloned().collect();
    respond(&headers, &rows).await
}

pub async fn get_theme(State(state): State<Arc<AppState>>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: state.theme.get().await,
    })
}

pub async fn put_theme(State(state): State<Arc<AppState>>, Json(body): Json<ThemeBody>) -> ApiResult<Json<ThemeBody>> {
    state.theme.set(body.theme).await?;
    Ok(Json(body))
}

/// Stream one topic as length-prefixed JSON chunks
pub async fn stream_topic(
    Path(topic): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let topic = Topic::parse(&topic).map_err(|e| ApiError::bad_request("unknown_topic", e.to_string()))?;
    tracing::debug!(topic = topic.as_str(), "chunked stream opened");

    let rx = state.hub.subscribe(topic);
    let stop = state.shutdown.clone().cancelled_owned();
    Ok(stream_from_receiver(rx, accepts_brotli(&headers), stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_categories() {
        assert!(parse_categories(None).unwrap().is_empty());
        assert_eq!(
            parse_categories(Some("sensor-error, event-info,")).unwrap(),
            vec![AlertCategory::SensorError, AlertCategory::EventInfo]
        );
        assert!(matches!(
            parse_categories(Some("sensor-error,panic")),
            Err(ApiError::BadRequest { kind: "invalid_category", .. })
        ));
    }
}
