// Application state for HTTP handlers
use crate::application::channels::ChannelHub;
use crate::application::sensor_service::SensorService;
use crate::application::status_service::StatusService;
use crate::infrastructure::theme_store::ThemeStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub sensor_service: SensorService,
    pub status_service: StatusService,
    pub hub: Arc<ChannelHub>,
    pub theme: Arc<ThemeStore>,
    /// Cancelled on shutdown to end long-lived streams
    pub shutdown: CancellationToken,
}
