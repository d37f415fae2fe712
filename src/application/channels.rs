// Topic-keyed push channels for live telemetry
use crate::domain::alert::EventLogItem;
use crate::domain::entity::{MonitoredEntity, SensorDelta};
use crate::domain::motor::MotorDelta;
use crate::domain::telemetry::{ChartPoint, HydraulicTelemetry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "telemetry:dashboard")]
    Dashboard,
    #[serde(rename = "telemetry:hydraulic")]
    Hydraulic,
    #[serde(rename = "sensors:values")]
    SensorValues,
    #[serde(rename = "sensors:alerts")]
    SensorAlerts,
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "motors:nodes")]
    MotorNodes,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Dashboard,
        Topic::Hydraulic,
        Topic::SensorValues,
        Topic::SensorAlerts,
        Topic::Events,
        Topic::MotorNodes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Dashboard => "telemetry:dashboard",
            Topic::Hydraulic => "telemetry:hydraulic",
            Topic::SensorValues => "sensors:values",
            Topic::SensorAlerts => "sensors:alerts",
            Topic::Events => "events",
            Topic::MotorNodes => "motors:nodes",
        }
    }

    pub fn parse(raw: &str) -> Result<Topic, ChannelError> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == raw)
            .ok_or_else(|| ChannelError::UnknownTopic(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub code: String,
    pub message: String,
}

/// A frame delivered on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum PushMessage {
    #[serde(rename = "telemetry:dashboard")]
    ChartPoint(ChartPoint),
    #[serde(rename = "telemetry:hydraulic")]
    Hydraulic(Box<HydraulicTelemetry>),
    #[serde(rename = "sensors:values")]
    SensorValue(SensorDelta),
    #[serde(rename = "sensors:alerts")]
    SensorAlert(MonitoredEntity),
    #[serde(rename = "events")]
    Event(EventLogItem),
    #[serde(rename = "motors:nodes")]
    MotorNode(MotorDelta),
    #[serde(rename = "error")]
    Error(ErrorFrame),
}

impl PushMessage {
    /// Topic this message is published on; `None` for error frames.
    pub fn topic(&self) -> Option<Topic> {
        match self {
            PushMessage::ChartPoint(_) => Some(Topic::Dashboard),
            PushMessage::Hydraulic(_) => Some(Topic::Hydraulic),
            PushMessage::SensorValue(_) => Some(Topic::SensorValues),
            PushMessage::SensorAlert(_) => Some(Topic::SensorAlerts),
            PushMessage::Event(_) => Some(Topic::Events),
            PushMessage::MotorNode(_) => Some(Topic::MotorNodes),
            PushMessage::Error(_) => None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        PushMessage::Error(ErrorFrame {
            code: code.to_string(),
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    #[error("unknown topic '{0}'")]
    UnknownTopic(String),

    #[error("error frames cannot be published")]
    Unroutable,
}

/// One broadcast channel per topic.
#[derive(Debug)]
pub struct ChannelHub {
    senders: HashMap<Topic, broadcast::Sender<PushMessage>>,
}

impl ChannelHub {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let senders = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();
        Self { senders }
    }

    /// Publish to the message's topic. Returns how many subscribers got it.
    pub fn publish(&self, msg: PushMessage) -> Result<usize, ChannelError> {
        let topic = msg.topic().ok_or(ChannelError::Unroutable)?;
        let sender = self.sender(topic);
        // No subscribers is not an error
        Ok(sender.send(msg).unwrap_or(0))
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<PushMessage> {
        self.sender(topic).subscribe()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<PushMessage> {
        // Every topic gets a sender in `new`
        &self.senders[&topic]
    }
}
