use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

use crate::chart::{ChartPoint, ChartView};
use crate::error::Result;
use crate::pipeline::DashboardSeries;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesExport {
    pub view: ChartView,
    pub chart: Vec<ChartPoint>,
    pub series: DashboardSeries,
}

pub fn save_export(path: &Path, export: &SeriesExport) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(export)?)?;
    info!("Saved {} chart points ({}) to {}", export.chart.len(), export.view, path.display());
    Ok(())
}

/// `None` when nothing was saved yet or the file is unreadable.
pub fn load_export(path: &Path) -> Option<SeriesExport> {
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).ok(),
        Err(e) => {
            error!("Failed to load series: {}", e);
            None
        }
    }
}
