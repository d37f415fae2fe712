// Domain layer - Pure types and classification rules
pub mod alert;
pub mod dashboard;
pub mod entity;
pub mod error;
pub mod level;
pub mod motor;
pub mod telemetry;
pub mod threshold;
