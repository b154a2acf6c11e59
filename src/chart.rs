use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::DashboardSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartView {
    #[default]
    Bank,
    Shares,
    /// Share value over time. Not charted yet; projects nothing.
    Value,
}

impl ChartView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartView::Bank => "bank",
            ChartView::Shares => "shares",
            ChartView::Value => "value",
        }
    }
}

impl fmt::Display for ChartView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bank" => Ok(ChartView::Bank),
            "shares" => Ok(ChartView::Shares),
            "value" => Ok(ChartView::Value),
            other => Err(format!("unknown chart view `{other}` (expected bank, shares or value)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: u64,
    pub y: BigDecimal,
}

/// Active view plus the series it projects from. Switching views never
/// touches the chain.
#[derive(Debug, Clone, Default)]
pub struct ChartState {
    view: ChartView,
    series: Option<DashboardSeries>,
}

impl ChartState {
    pub fn new(view: ChartView) -> Self {
        Self { view, series: None }
    }

    pub fn view(&self) -> ChartView {
        self.view
    }

    pub fn select(&mut self, view: ChartView) {
        debug!("chart view {} -> {}", self.view, view);
        self.view = view;
    }

    pub fn series(&self) -> Option<&DashboardSeries> {
        self.series.as_ref()
    }

    pub fn set_series(&mut self, series: DashboardSeries) {
        self.series = Some(series);
    }

    pub fn projected(&self) -> Vec<ChartPoint> {
        let Some(series) = &self.series else {
            return Vec::new();
        };
        let source = match self.view {
            ChartView::Bank => &series.bank,
            ChartView::Shares => &series.shares,
            ChartView::Value => return Vec::new(),
        };
        source
            .points
            .iter()
            .map(|p| ChartPoint { x: p.block_number, y: p.cumulative.clone() })
            .collect()
    }
}

/// Fixed-point rendering for display, e.g. `format_amount(d, 4)` -> `"12.5000"`.
pub fn format_amount(value: &BigDecimal, places: u32) -> String {
    value.with_scale_round(i64::from(places), RoundingMode::HalfUp).to_string()
}
