// Application layer - Use cases, aggregation and the live feed
pub mod aggregator;
pub mod channels;
pub mod error;
pub mod feed;
pub mod sensor_service;
pub mod status_service;
pub mod telemetry_source;
