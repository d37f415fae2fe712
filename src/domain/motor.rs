// Drive motor nodes placed on the machine plan, grouped by zone
use crate::domain::level::{worst_level, Level};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorStatus {
    Ok,
    Warn,
    Error,
}

impl MotorStatus {
    pub fn level(&self) -> Level {
        match self {
            MotorStatus::Ok => Level::Ok,
            MotorStatus::Warn => Level::Warn,
            MotorStatus::Error => Level::Crit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Front,
    Middle,
    Rear,
}

impl Zone {
    /// Front to rear
    pub const ALL: [Zone; 3] = [Zone::Front, Zone::Middle, Zone::Rear];

    pub fn name(&self) -> &'static str {
        match self {
            Zone::Front => "Frente",
            Zone::Middle => "Centro",
            Zone::Rear => "Cola",
        }
    }
}

/// A motor as drawn on the plan. `position` is `[y, x]` in plan pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorNode {
    pub id: String,
    pub label: String,
    pub position: [f64; 2],
    pub status: MotorStatus,
    pub zone: Zone,
    pub temp_c: f64,
    pub rpm: f64,
    pub current_a: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MotorNode {
    pub fn level(&self) -> Level {
        self.status.level()
    }

    pub fn apply(&mut self, delta: &MotorDelta) {
        if let Some(status) = delta.status {
            self.status = status;
        }
        if let Some(temp_c) = delta.temp_c {
            self.temp_c = temp_c;
        }
        if let Some(rpm) = delta.rpm {
            self.rpm = rpm;
        }
        if let Some(current_a) = delta.current_a {
            self.current_a = current_a;
        }
        self.updated_at = Some(delta.updated_at);
    }
}

/// Partial update for one motor; absent fields keep their value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorDelta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MotorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_a: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCounts {
    pub ok: usize,
    pub warn: usize,
    pub error: usize,
}

impl MotorCounts {
    fn add(&mut self, status: MotorStatus) {
        match status {
            MotorStatus::Ok => self.ok += 1,
            MotorStatus::Warn => self.warn += 1,
            MotorStatus::Error => self.error += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: Zone,
    pub name: String,
    pub nodes: usize,
    pub counts: MotorCounts,
    /// Ring colour of the zone cluster: any error is crit, else any warn.
    pub worst: Level,
}

/// One summary per zone, front to rear. Zones without motors are `Ok`.
pub fn summarize_zones(nodes: &[MotorNode]) -> Vec<ZoneSummary> {
    Zone::ALL
        .into_iter()
        .map(|zone| {
            let members: Vec<&MotorNode> = nodes.iter().filter(|n| n.zone == zone).collect();
            let mut counts = MotorCounts::default();
            for node in &members {
                counts.add(node.status);
            }
            ZoneSummary {
                zone,
                name: zone.name().to_string(),
                nodes: members.len(),
                counts,
                worst: worst_level(members.iter().map(|n| n.level())),
            }
        })
        .collect()
}
