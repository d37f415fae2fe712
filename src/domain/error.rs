// Errors raised by the classification and aggregation core
use thiserror::Error;

/// Data-shape and configuration problems detected by the status core.
///
/// Nothing here is transient: every variant describes input that will keep
/// failing until the data or the threshold table is fixed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatusError {
    #[error("no threshold configured for metric '{metric_id}'")]
    Configuration { metric_id: String },

    #[error("threshold for '{metric_id}' is inconsistent: warn={warn}, crit={crit}, invert={invert}")]
    ThresholdOrder {
        metric_id: String,
        warn: f64,
        crit: f64,
        invert: bool,
    },

    #[error("metric '{metric_id}' is configured more than once")]
    DuplicateMetric { metric_id: String },

    #[error("metric '{metric_id}' has an invalid scale maximum {scale_max}")]
    InvalidScale { metric_id: String, scale_max: f64 },

    #[error("non-finite value {value} for metric '{}'", metric_id.as_deref().unwrap_or("<unnamed>"))]
    InvalidValue {
        metric_id: Option<String>,
        value: f64,
    },

    #[error("unparseable timestamp '{raw}'")]
    MalformedTimestamp { raw: String },
}

impl StatusError {
    /// Short machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            StatusError::Configuration { .. } => "configuration_error",
            StatusError::ThresholdOrder { .. }
            | StatusError::DuplicateMetric { .. }
            | StatusError::InvalidScale { .. } => "threshold_table_error",
            StatusError::InvalidValue { .. } => "invalid_value_error",
            StatusError::MalformedTimestamp { .. } => "malformed_timestamp_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_message_without_metric() {
        let err = StatusError::InvalidValue {
            metric_id: None,
            value: f64::NAN,
        };
        assert_eq!(err.to_string(), "non-finite value NaN for metric '<unnamed>'");
        assert_eq!(err.kind(), "invalid_value_error");
    }
}
