use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use clap::{Parser, Subcommand};
use dao_series::{
    available_minions, format_amount, get_network, load_series, save_export, ChartState, ChartView,
    Config, DaoContext, Dashboard, DashboardSession, EthLogSource, GraphClient, LogSource,
    PriceClient, SeriesExport, Snapshot, Status,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dao-series")]
#[command(about = "Share and guild bank history for a Moloch DAO")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both series once and print the selected chart
    Series {
        #[arg(long, default_value = "bank")]
        view: ChartView,
        /// Write the chart and series as JSON to OUTPUT_PATH
        #[arg(long)]
        save: bool,
    },
    /// Poll metadata and series until Ctrl-C
    Watch {
        #[arg(long, default_value = "bank")]
        view: ChartView,
    },
    /// Print USD quotes for the guild bank's tokens
    Prices,
    /// List minions that can be summoned on the configured chain
    Minions {
        #[arg(long)]
        chain_id: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::from_default_env().add_directive("dao_series=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Series { view, save } => run_series(view, save).await,
        Commands::Watch { view } => run_watch(view).await,
        Commands::Prices => run_prices().await,
        Commands::Minions { chain_id } => run_minions(chain_id),
    }
}

async fn run_series(view: ChartView, save: bool) -> Result<()> {
    let config = Config::from_env()?;
    let source = EthLogSource::new(&config.rpc_url).context("rpc provider")?;
    let ctx = DaoContext::resolve(&config, &source).await.context("resolve DAO contracts")?;

    let latest = source.latest_block().await.context("latest block")?;
    info!("Reading blocks {}..={}", ctx.range.from, latest);
    let series = load_series(&source, &ctx).await.context("load series")?;
    let mut chart = ChartState::new(view);
    chart.set_series(series.clone());
    let points = chart.projected();

    info!("{} view: {} points", view, points.len());
    for p in &points {
        println!("{:>12}  {}", p.x, format_amount(&p.y, 4));
    }
    if view == ChartView::Value {
        warn!("value view is not charted yet");
    }

    if save {
        save_export(&config.output_path, &SeriesExport { view, chart: points, series })?;
    }
    Ok(())
}

async fn run_watch(view: ChartView) -> Result<()> {
    let config = Config::from_env()?;
    let source = EthLogSource::new(&config.rpc_url).context("rpc provider")?;
    let ctx = DaoContext::resolve(&config, &source).await.context("resolve DAO contracts")?;
    let network = get_network(config.chain_id);
    if network.is_none() {
        warn!("Unknown chain id {}: prices disabled", config.chain_id);
    }

    let mut dashboard = Dashboard::new(
        source,
        ctx,
        network,
        GraphClient::new(config.graph_url.clone()),
        PriceClient::new(config.price_api_url.clone(), config.token_list_url.clone()),
    );
    dashboard.select(view);

    info!("Watching DAO {:?} every {:?}", config.dao_address, config.poll_interval);
    let session = DashboardSession::spawn(dashboard, config.poll_interval);
    let mut snapshots = session.snapshots();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                print_snapshot(&snap);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }
    drop(session);
    Ok(())
}

fn print_snapshot(snap: &Snapshot) {
    match &snap.status {
        Status::Loading => info!("Loading..."),
        Status::Failed(msg) => error!("Metadata unavailable: {}", msg),
        Status::Ready => {
            let show = |v: &Option<BigDecimal>| v.as_ref().map(|d| format_amount(d, 4)).unwrap_or_default();
            info!(
                "Bank: {} | Shares: {} | Share Value: {}",
                show(&snap.bank_value),
                snap.total_shares.as_ref().map(|d| d.to_string()).unwrap_or_default(),
                show(&snap.share_value)
            );
        }
    }
    if let Some(last) = snap.chart.last() {
        info!("{} chart: {} points, latest {} at block {}", snap.view, snap.chart.len(), format_amount(&last.y, 4), last.x);
    }
}

async fn run_prices() -> Result<()> {
    let config = Config::from_env()?;
    let network = get_network(config.chain_id).with_context(|| format!("unsupported chain id {}", config.chain_id))?;
    let graph = GraphClient::new(config.graph_url.clone());
    let metadata = graph.dao_metadata(config.dao_address).await.context("metadata query")?;
    let client = PriceClient::new(config.price_api_url.clone(), config.token_list_url.clone());
    let quotes = client.quotes_for(&network, &metadata.token_balances).await.context("price fetch")?;

    for balance in &metadata.token_balances {
        let usd = quotes.get(&balance.token.token_address.to_lowercase()).map(|q| q.usd);
        match usd {
            Some(usd) => println!("{:<8} {:>14.4} USD", balance.token.symbol, usd),
            None => println!("{:<8} {:>14}", balance.token.symbol, "n/a"),
        }
    }
    Ok(())
}

fn run_minions(chain_id: Option<u64>) -> Result<()> {
    let chain_id = match chain_id {
        Some(id) => id,
        None => Config::from_env()?.chain_id,
    };
    for minion in available_minions(chain_id) {
        match minion.publisher {
            Some(publisher) => println!("{:<20} {} [{}]", minion.title, minion.description, publisher),
            None => println!("{:<20} {}", minion.title, minion.description),
        }
        for line in minion.info {
            println!("{:<20} {}", "", line.trim());
        }
    }
    Ok(())
}
