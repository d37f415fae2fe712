// Per-metric threshold configuration
use crate::domain::error::StatusError;
use crate::domain::level::{classify, Level};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    pub metric_id: String,
    pub warn: f64,
    pub crit: f64,
    /// Lower values are worse (efficiency, flow, advance rate).
    #[serde(default)]
    pub invert: bool,
    /// Upper bound for gauges and bars. Not used for classification.
    pub scale_max: f64,
}

impl MetricThreshold {
    pub fn new(metric_id: &str, warn: f64, crit: f64, invert: bool, scale_max: f64) -> Self {
        Self {
            metric_id: metric_id.to_string(),
            warn,
            crit,
            invert,
            scale_max,
        }
    }

    /// The crit boundary must sit at or beyond warn in the bad direction.
    pub fn check_order(&self) -> Result<(), StatusError> {
        let ordered = if self.invert {
            self.crit <= self.warn
        } else {
            self.crit >= self.warn
        };

        if !ordered || !self.warn.is_finite() || !self.crit.is_finite() {
            return Err(StatusError::ThresholdOrder {
                metric_id: self.metric_id.clone(),
                warn: self.warn,
                crit: self.crit,
                invert: self.invert,
            });
        }

        if !self.scale_max.is_finite() || self.scale_max <= 0.0 {
            return Err(StatusError::InvalidScale {
                metric_id: self.metric_id.clone(),
                scale_max: self.scale_max,
            });
        }

        Ok(())
    }

    pub fn classify(&self, value: f64) -> Level {
        classify(value, self.warn, self.crit, self.invert)
    }

    /// Position of `value` on the display scale, clamped to `0..=1`.
    pub fn fraction_of_scale(&self, value: f64) -> f64 {
        let fraction = value / self.scale_max;
        if fraction.is_nan() {
            return 0.0;
        }
        fraction.clamp(0.0, 1.0)
    }
}

/// Validated lookup table of metric thresholds.
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    rows: BTreeMap<String, MetricThreshold>,
}

impl ThresholdTable {
    pub fn new(rows: Vec<MetricThreshold>) -> Result<Self, StatusError> {
        let mut table = BTreeMap::new();
        for row in rows {
            row.check_order()?;
            if table.contains_key(&row.metric_id) {
                return Err(StatusError::DuplicateMetric {
                    metric_id: row.metric_id,
                });
            }
            table.insert(row.metric_id.clone(), row);
        }
        Ok(Self { rows: table })
    }

    /// Cutting-head and hydraulic thresholds of the machine.
    pub fn builtin() -> Self {
        let rows = vec![
            MetricThreshold::new("cutting.rpm", 16.0, 20.0, false, 24.0),
            MetricThreshold::new("cutting.torque", 900.0, 1200.0, false, 1400.0),
            MetricThreshold::new("cutting.temperature", 75.0, 90.0, false, 110.0),
            MetricThreshold::new("cutting.wear_level", 60.0, 85.0, false, 100.0),
            MetricThreshold::new("cutting.advance_rate", 5.0, 3.0, true, 12.0),
            MetricThreshold::new("cutting.cutter_pressure", 110.0, 140.0, false, 160.0),
            MetricThreshold::new("cutting.vibration", 6.0, 10.0, false, 12.0),
            MetricThreshold::new("cutting.slurry_flow", 12.0, 8.0, true, 30.0),
            MetricThreshold::new("hydraulic.pressure_main", 110.0, 140.0, false, 160.0),
            MetricThreshold::new("hydraulic.pressure_return", 35.0, 45.0, false, 60.0),
            MetricThreshold::new("hydraulic.temp_in", 70.0, 85.0, false, 100.0),
            MetricThreshold::new("hydraulic.temp_out", 75.0, 90.0, false, 100.0),
            MetricThreshold::new("hydraulic.efficiency", 80.0, 70.0, true, 100.0),
        ];

        Self {
            rows: rows
                .into_iter()
                .map(|row| (row.metric_id.clone(), row))
                .collect(),
        }
    }

    /// Replace rows with matching ids and add the rest.
    pub fn with_overrides(mut self, overrides: Vec<MetricThreshold>) -> Result<Self, StatusError> {
        // Reject duplicates inside the override list itself
        let overrides = ThresholdTable::new(overrides)?;
        for (id, row) in overrides.rows {
            if self.rows.insert(id.clone(), row).is_some() {
                tracing::info!(metric_id = %id, "threshold overridden by configuration");
            }
        }
        Ok(self)
    }

    pub fn get(&self, metric_id: &str) -> Result<&MetricThreshold, StatusError> {
        self.rows
            .get(metric_id)
            .ok_or_else(|| StatusError::Configuration {
                metric_id: metric_id.to_string(),
            })
    }

    pub fn classify_metric(&self, metric_id: &str, value: f64) -> Result<Level, StatusError> {
        let threshold = self.get(metric_id)?;
        if !value.is_finite() {
            return Err(StatusError::InvalidValue {
                metric_id: Some(metric_id.to_string()),
                value,
            });
        }
        Ok(threshold.classify(value))
    }

    pub fn rows(&self) -> impl Iterator<Item = &MetricThreshold> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rows_are_consistent() {
        let builtin = ThresholdTable::builtin();
        for row in builtin.rows() {
            row.check_order().unwrap();
        }
        assert_eq!(builtin.len(), 13);
    }

    #[test]
    fn test_classify_metric() {
        let table = ThresholdTable::builtin();
        assert_eq!(table.classify_metric("hydraulic.temp_out", 82.0), Ok(Level::Warn));
        assert_eq!(table.classify_metric("hydraulic.efficiency", 87.0), Ok(Level::Ok));
        assert_eq!(table.classify_metric("cutting.advance_rate", 2.5), Ok(Level::Crit));
        assert_eq!(table.classify_metric("cutting.slurry_flow", 10.0), Ok(Level::Warn));
    }

    #[test]
    fn test_unknown_metric_is_configuration_error() {
        let table = ThresholdTable::builtin();
        let err = table.classify_metric("cutting.noise", 1.0).unwrap_err();
        assert_eq!(
            err,
            StatusError::Configuration {
                metric_id: "cutting.noise".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_metric_value_is_rejected() {
        let table = ThresholdTable::builtin();
        let err = table.classify_metric("cutting.rpm", f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            StatusError::InvalidValue { metric_id: Some(ref id), .. } if id == "cutting.rpm"
        ));
    }

    #[test]
    fn test_inconsistent_rows_are_refused() {
        let err = ThresholdTable::new(vec![MetricThreshold::new("x", 90.0, 70.0, false, 100.0)])
            .unwrap_err();
        assert!(matches!(err, StatusError::ThresholdOrder { .. }));

        let err = ThresholdTable::new(vec![MetricThreshold::new("y", 70.0, 90.0, true, 100.0)])
            .unwrap_err();
        assert!(matches!(err, StatusError::ThresholdOrder { .. }));

        let err = ThresholdTable::new(vec![MetricThreshold::new("z", 1.0, 2.0, false, 0.0)])
            .unwrap_err();
        assert!(matches!(err, StatusError::InvalidScale { .. }));
    }

    #[test]
    fn test_duplicate_rows_are_refused() {
        let rows = vec![
            MetricThreshold::new("a", 1.0, 2.0, false, 3.0),
            MetricThreshold::new("a", 1.0, 2.0, false, 3.0),
        ];
        assert!(matches!(
            ThresholdTable::new(rows),
            Err(StatusError::DuplicateMetric { .. })
        ));
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let table = ThresholdTable::builtin()
            .with_overrides(vec![
                MetricThreshold::new("cutting.rpm", 10.0, 12.0, false, 24.0),
                MetricThreshold::new("gas.ch4", 500.0, 1000.0, false, 2000.0),
            ])
            .unwrap();

        assert_eq!(table.classify_metric("cutting.rpm", 14.6), Ok(Level::Crit));
        assert_eq!(table.classify_metric("gas.ch4", 1200.0), Ok(Level::Crit));
        assert_eq!(table.len(), 14);
    }

    #[test]
    fn test_fraction_of_scale() {
        let row = MetricThreshold::new("hydraulic.pressure_main", 110.0, 140.0, false, 160.0);
        assert_eq!(row.fraction_of_scale(80.0), 0.5);
        assert_eq!(row.fraction_of_scale(-3.0), 0.0);
        assert_eq!(row.fraction_of_scale(400.0), 1.0);
        assert_eq!(row.fraction_of_scale(f64::NAN), 0.0);
    }

    #[test]
    fn test_invert_defaults_to_false() {
        let row: MetricThreshold =
            serde_json::from_str(r#"{"metric_id":"m","warn":1,"crit":2,"scale_max":3}"#).unwrap();
        assert!(!row.invert);
    }
}
