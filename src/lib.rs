pub mod chain;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod export;
pub mod graph;
pub mod minions;
pub mod pipeline;
pub mod prices;
pub mod series;

pub use chain::{get_network, EthLogSource, LogSource, Network};
pub use chart::{format_amount, ChartPoint, ChartState, ChartView};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardSession, Snapshot, Status};
pub use error::{Error, Result};
pub use events::{normalize, Event, EventKind, NormalizeRule};
pub use export::{load_export, save_export, SeriesExport};
pub use graph::{DaoMetadata, GraphClient};
pub use minions::{available_minions, MinionKind};
pub use pipeline::{balance_series, load_series, share_series, DaoContext, DashboardSeries};
pub use prices::{PriceBook, PriceClient};
pub use series::{running_total, Baseline, RunningPoint, Series};
