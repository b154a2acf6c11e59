//! Polling dashboard: metadata, series and prices for one DAO, published as
//! snapshots from a background task.

use bigdecimal::BigDecimal;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::chain::{LogSource, Network};
use crate::chart::{ChartPoint, ChartState, ChartView};
use crate::error::Result;
use crate::graph::{DaoMetadata, GraphClient};
use crate::pipeline::{load_series, DaoContext, DashboardSeries};
use crate::prices::{PriceBook, PriceClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum Status {
    Loading,
    Ready,
    /// Metadata query failed; shown instead of the dashboard.
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: Status,
    pub view: ChartView,
    pub chart: Vec<ChartPoint>,
    pub series: Option<DashboardSeries>,
    pub total_shares: Option<BigDecimal>,
    pub bank_value: Option<BigDecimal>,
    pub share_value: Option<BigDecimal>,
    pub prices: PriceBook,
}

pub struct Dashboard<S> {
    source: S,
    ctx: DaoContext,
    network: Option<Network>,
    graph: GraphClient,
    price_client: PriceClient,
    chart: ChartState,
    metadata: Option<DaoMetadata>,
    prices: PriceBook,
    status: Status,
}

impl<S: LogSource> Dashboard<S> {
    pub fn new(
        source: S,
        ctx: DaoContext,
        network: Option<Network>,
        graph: GraphClient,
        price_client: PriceClient,
    ) -> Self {
        Self {
            source,
            ctx,
            network,
            graph,
            price_client,
            chart: ChartState::default(),
            metadata: None,
            prices: PriceBook::default(),
            status: Status::Loading,
        }
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn select(&mut self, view: ChartView) {
        self.chart.select(view);
    }

    /// One poll: metadata and series in parallel, then prices when the
    /// guild bank's token set changed or the last price fetch failed.
    /// Failures are logged, never returned.
    pub async fn refresh(&mut self) {
        let (metadata, series) = tokio::join!(
            self.graph.dao_metadata(self.ctx.dao),
            load_series(&self.source, &self.ctx)
        );
        self.apply_series(series);
        let changed = self.apply_metadata(metadata);
        if self.prices_due(changed) {
            self.refresh_prices().await;
        }
    }

    pub async fn refresh_series(&mut self) -> bool {
        let series = load_series(&self.source, &self.ctx).await;
        self.apply_series(series)
    }

    /// Keeps the previous series when the load failed.
    pub fn apply_series(&mut self, series: Result<DashboardSeries>) -> bool {
        match series {
            Ok(series) => {
                info!(
                    "series loaded: {} share points, {} bank points",
                    series.shares.points.len(),
                    series.bank.points.len()
                );
                self.chart.set_series(series);
                true
            }
            Err(e) => {
                warn!("series load failed: {}", e);
                false
            }
        }
    }

    /// Returns whether the token balances changed, i.e. prices are due.
    pub fn apply_metadata(&mut self, metadata: Result<DaoMetadata>) -> bool {
        match metadata {
            Ok(metadata) => {
                let changed = self
                    .metadata
                    .as_ref()
                    .map_or(true, |old| old.token_balances != metadata.token_balances);
                self.metadata = Some(metadata);
                self.status = Status::Ready;
                changed
            }
            Err(e) => {
                error!("metadata query failed: {}", e);
                self.status = Status::Failed(e.to_string());
                false
            }
        }
    }

    /// Prices need metadata; with it, they are fetched when balances changed
    /// or no fetch has succeeded since the last failure.
    pub fn prices_due(&self, balances_changed: bool) -> bool {
        self.status == Status::Ready && (balances_changed || self.prices.needs_refresh())
    }

    pub async fn refresh_prices(&mut self) {
        let (Some(network), Some(metadata)) = (&self.network, &self.metadata) else {
            return;
        };
        self.prices.refresh(&self.price_client, network, &metadata.token_balances).await;
    }

    pub fn snapshot(&self) -> Snapshot {
        let token = self.ctx.token;
        Snapshot {
            status: self.status.clone(),
            view: self.chart.view(),
            chart: self.chart.projected(),
            series: self.chart.series().cloned(),
            total_shares: self.metadata.as_ref().map(DaoMetadata::total_shares),
            bank_value: self.metadata.as_ref().map(|m| m.guild_bank_value(token)),
            share_value: self.metadata.as_ref().map(|m| m.share_value(token)),
            prices: self.prices.clone(),
        }
    }
}

/// A running dashboard. Dropping it cancels the poll loop and any fetch in
/// flight.
pub struct DashboardSession {
    handle: JoinHandle<()>,
    views: watch::Sender<ChartView>,
    snapshots: watch::Receiver<Snapshot>,
}

impl DashboardSession {
    pub fn spawn<S>(mut dashboard: Dashboard<S>, poll_interval: Duration) -> Self
    where
        S: LogSource + 'static,
    {
        let (snap_tx, snap_rx) = watch::channel(dashboard.snapshot());
        let (view_tx, mut view_rx) = watch::channel(dashboard.chart().view());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => dashboard.refresh().await,
                    changed = view_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let view = *view_rx.borrow_and_update();
                        dashboard.select(view);
                    }
                }
                if snap_tx.send(dashboard.snapshot()).is_err() {
                    break;
                }
            }
        });

        Self { handle, views: view_tx, snapshots: snap_rx }
    }

    pub fn select(&self, view: ChartView) {
        let _ = self.views.send(view);
    }

    pub fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
