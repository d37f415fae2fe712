// Subsystem telemetry snapshots served to the dashboard views
use crate::domain::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingTelemetry {
    pub rpm: f64,
    /// Nm
    pub torque: f64,
    /// °C
    pub temperature: f64,
    /// %
    pub wear_level: f64,
    /// m/h
    pub advance_rate: f64,
    /// bar
    pub cutter_pressure: f64,
    /// mm/s
    pub vibration: f64,
    /// m³/h
    pub slurry_flow: f64,
    pub is_running: bool,
}

impl CuttingTelemetry {
    /// `(metric_id, value)` for every classified metric.
    pub fn readings(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("cutting.rpm", self.rpm),
            ("cutting.torque", self.torque),
            ("cutting.temperature", self.temperature),
            ("cutting.wear_level", self.wear_level),
            ("cutting.vibration", self.vibration),
            ("cutting.cutter_pressure", self.cutter_pressure),
            ("cutting.slurry_flow", self.slurry_flow),
            ("cutting.advance_rate", self.advance_rate),
        ]
    }

    /// Seconds per revolution of the cutting-wheel animation, slowed down by
    /// `slowdown` and never shorter than `min_period`. Zero when stopped.
    pub fn spin_period_secs(&self, slowdown: f64, min_period: f64) -> f64 {
        if !self.is_running || self.rpm <= 0.0 {
            return 0.0;
        }
        let raw = slowdown * (60.0 / self.rpm.max(0.1));
        raw.max(min_period)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureData {
    pub main: f64,
    #[serde(rename = "return")]
    pub return_line: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    pub inlet: f64,
    pub outlet: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OilTank {
    pub id: String,
    pub name: String,
    pub level_pct: f64,
    pub capacity_l: f64,
}

impl OilTank {
    pub fn new(id: &str, name: &str, level_pct: f64, capacity_l: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level_pct,
            capacity_l,
        }
    }

    pub fn volume_l(&self) -> f64 {
        self.capacity_l * self.level_pct.clamp(0.0, 100.0) / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterStatus {
    Ok,
    Revisar,
    Cambiar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemData {
    /// L/min
    pub flow_rate: f64,
    /// cSt
    pub viscosity: f64,
    pub operating_hours: f64,
    /// %
    pub efficiency: f64,
    pub filter_status: FilterStatus,
    pub maintenance_alert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydraulicTelemetry {
    pub pressure: PressureData,
    pub temperatures: Temperatures,
    pub tanks: Vec<OilTank>,
    pub system: SystemData,
}

impl HydraulicTelemetry {
    pub fn readings(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("hydraulic.pressure_main", self.pressure.main),
            ("hydraulic.pressure_return", self.pressure.return_line),
            ("hydraulic.temp_in", self.temperatures.inlet),
            ("hydraulic.temp_out", self.temperatures.outlet),
            ("hydraulic.efficiency", self.system.efficiency),
        ]
    }

    pub fn pressure_delta(&self) -> f64 {
        self.pressure.main - self.pressure.return_line
    }

    pub fn temperature_delta(&self) -> f64 {
        self.temperatures.outlet - self.temperatures.inlet
    }
}

/// A classified reading with its position on the display scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub metric_id: String,
    pub value: f64,
    pub level: Level,
    pub fraction: f64,
}

/// Headline KPI shown on the home dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard {
    pub title: String,
    pub value: f64,
    pub measure: String,
    pub max_value: f64,
}

impl MetricCard {
    pub fn new(title: &str, value: f64, measure: &str, max_value: f64) -> Self {
        Self {
            title: title.to_string(),
            value,
            measure: measure.to_string(),
            max_value,
        }
    }

    /// Fill percentage of the KPI bar, clamped to `0..=100`.
    pub fn percent(&self) -> f64 {
        if self.max_value <= 0.0 {
            return 0.0;
        }
        let pct = self.value / self.max_value * 100.0;
        if pct.is_nan() {
            return 0.0;
        }
        pct.clamp(0.0, 100.0)
    }
}

/// One sample of the live dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub presion: f64,
    pub torque: f64,
    pub velocidad: f64,
    pub temperatura: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl HistorySample {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cutting() -> CuttingTelemetry {
        CuttingTelemetry {
            rpm: 14.6,
            torque: 780.0,
            temperature: 68.3,
            wear_level: 32.0,
            advance_rate: 8.4,
            cutter_pressure: 95.0,
            vibration: 3.2,
            slurry_flow: 18.5,
            is_running: true,
        }
    }

    #[test]
    fn test_spin_period() {
        let mut c = cutting();
        // 4 * 60 / 14.6 = 16.43...
        let period = c.spin_period_secs(4.0, 8.0);
        assert!((period - 16.438).abs() < 0.01);

        c.rpm = 60.0;
        assert_eq!(c.spin_period_secs(4.0, 8.0), 8.0);

        c.is_running = false;
        assert_eq!(c.spin_period_secs(4.0, 8.0), 0.0);
    }

    #[test]
    fn test_metric_card_percent() {
        assert_eq!(MetricCard::new("Presion", 43.0, "Bar", 65.0).percent().round(), 66.0);
        assert_eq!(MetricCard::new("Temp", 200.0, "C", 130.0).percent(), 100.0);
        assert_eq!(MetricCard::new("Zero", 5.0, "C", 0.0).percent(), 0.0);
    }

    #[test]
    fn test_tank_volume_and_deltas() {
        let tank = OilTank::new("main", "Tanque principal", 50.0, 1000.0);
        assert_eq!(tank.volume_l(), 500.0);

        let h = HydraulicTelemetry {
            pressure: PressureData {
                main: 72.6,
                return_line: 23.8,
            },
            temperatures: Temperatures {
                inlet: 37.6,
                outlet: 45.7,
            },
            tanks: vec![tank],
            system: SystemData {
                flow_rate: 45.2,
                viscosity: 32.0,
                operating_hours: 1247.0,
                efficiency: 87.0,
                filter_status: FilterStatus::Ok,
                maintenance_alert: false,
            },
        };
        assert!((h.pressure_delta() - 48.8).abs() < 1e-9);
        assert!((h.temperature_delta() - 8.1).abs() < 1e-9);

        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["pressure"]["return"], 23.8);
        assert_eq!(json["system"]["filter_status"], "OK");
    }
}
