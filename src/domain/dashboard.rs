// Dashboard domain model
use super::telemetry::{ChartPoint, MetricCard};
use serde::Serialize;

/// A KPI card together with its bar fill percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    #[serde(flatten)]
    pub card: MetricCard,
    pub percent: f64,
}

impl From<MetricCard> for MetricTile {
    fn from(card: MetricCard) -> Self {
        let percent = card.percent();
        Self { card, percent }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub tiles: Vec<MetricTile>,
    pub chart: Vec<ChartPoint>,
}

impl Dashboard {
    pub fn new(title: String, cards: Vec<MetricCard>, chart: Vec<ChartPoint>) -> Self {
        Self {
            title,
            tiles: cards.into_iter().map(MetricTile::from).collect(),
            chart,
        }
    }
}
