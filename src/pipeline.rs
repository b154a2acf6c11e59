//! Retrieval, normalization and reduction of DAO activity into series.

use ethers::types::Address;
use futures_util::future::try_join;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::{
    read_approved_token, read_guild_bank, BlockRange, DaoEvent, EthLogSource, LogQuery, LogSource,
    TransferFilter,
};
use crate::config::Config;
use crate::error::Result;
use crate::events::{normalize, passed_proposals, NormalizeRule};
use crate::series::{running_total, Baseline, Series};

/// Everything the pipeline needs to know about one DAO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaoContext {
    pub dao: Address,
    pub guild_bank: Address,
    pub token: Address,
    pub token_decimals: u32,
    pub range: BlockRange,
}

impl DaoContext {
    /// Fills the guild bank and approved token from the DAO contract unless
    /// the config pins them.
    pub async fn resolve(config: &Config, source: &EthLogSource) -> Result<Self> {
        let guild_bank = match config.guild_bank_address {
            Some(addr) => addr,
            None => read_guild_bank(source.provider(), config.dao_address).await?,
        };
        let token = match config.token_address {
            Some(addr) => addr,
            None => read_approved_token(source.provider(), config.dao_address).await?,
        };
        info!("DAO {:?}: guild bank {:?}, token {:?}", config.dao_address, guild_bank, token);
        Ok(Self {
            dao: config.dao_address,
            guild_bank,
            token,
            token_decimals: config.token_decimals,
            range: BlockRange::from_block(config.from_block),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSeries {
    pub shares: Series,
    pub bank: Series,
}

/// Total shares over time: passed proposals mint, ragequits burn.
pub async fn share_series<S>(source: &S, ctx: &DaoContext) -> Result<Series>
where
    S: LogSource + ?Sized,
{
    let minted = LogQuery { address: ctx.dao, event: DaoEvent::ProcessProposal, filter: None, range: ctx.range };
    let burned = LogQuery { address: ctx.dao, event: DaoEvent::Ragequit, filter: None, range: ctx.range };
    let (minted, burned) = try_join(source.logs(&minted), source.logs(&burned)).await?;

    let minted = normalize(&passed_proposals(&minted), &NormalizeRule::minted_shares())?;
    let burned = normalize(&burned, &NormalizeRule::burned_shares())?;
    debug!("shares: {} minted, {} burned", minted.len(), burned.len());
    Ok(running_total(&minted, &burned, Baseline::shares(ctx.range.from)))
}

/// Guild bank balance of the approved token over time.
pub async fn balance_series<S>(source: &S, ctx: &DaoContext) -> Result<Series>
where
    S: LogSource + ?Sized,
{
    let transfers = |filter| LogQuery {
        address: ctx.token,
        event: DaoEvent::Transfer,
        filter: Some(filter),
        range: ctx.range,
    };
    let deposits = transfers(TransferFilter::To(ctx.guild_bank));
    let withdrawals = transfers(TransferFilter::From(ctx.guild_bank));
    let (deposits, withdrawals) = try_join(source.logs(&deposits), source.logs(&withdrawals)).await?;

    let deposits = normalize(&deposits, &NormalizeRule::deposits(ctx.token_decimals))?;
    let withdrawals = normalize(&withdrawals, &NormalizeRule::withdrawals(ctx.token_decimals))?;
    debug!("bank: {} deposits, {} withdrawals", deposits.len(), withdrawals.len());
    Ok(running_total(&deposits, &withdrawals, Baseline::balance(ctx.range.from)))
}

/// Both series, or nothing: a failure in either fetch fails the whole load.
pub async fn load_series<S>(source: &S, ctx: &DaoContext) -> Result<DashboardSeries>
where
    S: LogSource + ?Sized,
{
    let (shares, bank) = try_join(share_series(source, ctx), balance_series(source, ctx)).await?;
    Ok(DashboardSeries { shares, bank })
}
