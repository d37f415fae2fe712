// Level classification of numeric readings
use crate::domain::error::StatusError;
use serde::{Deserialize, Serialize};

/// Ordinal severity of a reading. `Ok < Warn < Crit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Ok,
    Warn,
    Crit,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Ok => "ok",
            Level::Warn => "warn",
            Level::Crit => "crit",
        }
    }

    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Level::Ok => "Normal",
            Level::Warn => "Advertencia",
            Level::Crit => "Crítico",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a value against warn/crit boundaries.
///
/// With `invert == false` higher values are worse; with `invert == true`
/// lower values are worse. NaN cannot be placed on either scale and is
/// reported as `Ok` with a warning; infinities compare like any other number.
pub fn classify(value: f64, warn: f64, crit: f64, invert: bool) -> Level {
    if value.is_nan() {
        tracing::warn!(warn, crit, invert, "NaN reading classified as ok");
        return Level::Ok;
    }

    if !invert {
        if value >= crit {
            Level::Crit
        } else if value >= warn {
            Level::Warn
        } else {
            Level::Ok
        }
    } else if value <= crit {
        Level::Crit
    } else if value <= warn {
        Level::Warn
    } else {
        Level::Ok
    }
}

/// Like [`classify`] but refuses non-finite input.
pub fn classify_checked(value: f64, warn: f64, crit: f64, invert: bool) -> Result<Level, StatusError> {
    if !value.is_finite() {
        return Err(StatusError::InvalidValue {
            metric_id: None,
            value,
        });
    }
    Ok(classify(value, warn, crit, invert))
}

/// Most severe level of the sequence; `Ok` when empty.
pub fn worst_level<I>(levels: I) -> Level
where
    I: IntoIterator<Item = Level>,
{
    levels.into_iter().max().unwrap_or(Level::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(from: f64, to: f64) -> Vec<f64> {
        let steps = 200;
        (0..steps)
            .map(|i| from + (to - from) * i as f64 / steps as f64)
            .collect()
    }

    #[test]
    fn test_below_warn_is_ok() {
        for (warn, crit) in [(70.0, 90.0), (0.0, 1.0), (-10.0, -5.0), (5.0, 5.0)] {
            for value in grid(warn - 100.0, warn) {
                assert_eq!(classify(value, warn, crit, false), Level::Ok, "value={value}");
            }
        }
    }

    #[test]
    fn test_between_warn_and_crit_is_warn() {
        for (warn, crit) in [(70.0, 90.0), (0.0, 1.0), (-10.0, -5.0)] {
            for value in grid(warn, crit) {
                assert_eq!(classify(value, warn, crit, false), Level::Warn, "value={value}");
            }
        }
    }

    #[test]
    fn test_at_or_above_crit_is_crit() {
        for (warn, crit) in [(70.0, 90.0), (0.0, 1.0), (5.0, 5.0)] {
            for value in grid(crit, crit + 100.0) {
                assert_eq!(classify(value, warn, crit, false), Level::Crit, "value={value}");
            }
        }
        assert_eq!(classify(f64::INFINITY, 70.0, 90.0, false), Level::Crit);
    }

    #[test]
    fn test_inverted_mirrors_comparisons() {
        let (warn, crit) = (80.0, 70.0);
        for value in grid(80.5, 200.0) {
            assert_eq!(classify(value, warn, crit, true), Level::Ok, "value={value}");
        }
        for value in grid(70.5, 80.0) {
            assert_eq!(classify(value, warn, crit, true), Level::Warn, "value={value}");
        }
        assert_eq!(classify(80.0, warn, crit, true), Level::Warn);
        for value in grid(-50.0, 70.0) {
            assert_eq!(classify(value, warn, crit, true), Level::Crit, "value={value}");
        }
        assert_eq!(classify(70.0, warn, crit, true), Level::Crit);
        assert_eq!(classify(f64::NEG_INFINITY, warn, crit, true), Level::Crit);
    }

    #[test]
    fn test_outlet_temperature_scenario() {
        assert_eq!(classify(82.0, 70.0, 90.0, false), Level::Warn);
    }

    #[test]
    fn test_efficiency_scenario() {
        assert_eq!(classify(87.0, 80.0, 70.0, true), Level::Ok);
    }

    #[test]
    fn test_nan_is_ok_but_rejected_when_checked() {
        assert_eq!(classify(f64::NAN, 70.0, 90.0, false), Level::Ok);
        assert_eq!(classify(f64::NAN, 80.0, 70.0, true), Level::Ok);

        let err = classify_checked(f64::NAN, 70.0, 90.0, false).unwrap_err();
        assert!(matches!(err, StatusError::InvalidValue { .. }));
        assert!(classify_checked(f64::INFINITY, 70.0, 90.0, false).is_err());
        assert_eq!(classify_checked(95.0, 70.0, 90.0, false), Ok(Level::Crit));
    }

    #[test]
    fn test_worst_level() {
        assert_eq!(worst_level(Vec::new()), Level::Ok);
        assert_eq!(worst_level([Level::Ok, Level::Warn]), Level::Warn);
        assert_eq!(worst_level([Level::Ok, Level::Warn, Level::Crit]), Level::Crit);

        let permutations = [
            [Level::Ok, Level::Warn, Level::Crit],
            [Level::Ok, Level::Crit, Level::Warn],
            [Level::Warn, Level::Ok, Level::Crit],
            [Level::Warn, Level::Crit, Level::Ok],
            [Level::Crit, Level::Ok, Level::Warn],
            [Level::Crit, Level::Warn, Level::Ok],
        ];
        for p in permutations {
            assert_eq!(worst_level(p), Level::Crit);
        }
    }

    #[test]
    fn test_level_wire_format() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
        let level: Level = serde_json::from_str("\"crit\"").unwrap();
        assert_eq!(level, Level::Crit);
        assert!(Level::Ok < Level::Warn && Level::Warn < Level::Crit);
    }
}
