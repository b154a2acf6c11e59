use anyhow::{Context, Result};
use ethers::types::Address;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::chain::address_from_hex;

#[derive(Debug, Clone)]
pub struct Config {
    pub dao_address: Address,
    pub chain_id: u64,
    pub rpc_url: String,
    pub graph_url: Url,
    pub guild_bank_address: Option<Address>,
    pub token_address: Option<Address>,
    pub token_decimals: u32,
    pub from_block: u64,
    pub poll_interval: Duration,
    pub price_api_url: Url,
    pub token_list_url: Url,
    pub output_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dao_address = lookup("DAO_ADDRESS").context("DAO_ADDRESS not set")?;
        let dao_address = address_from_hex(&dao_address).context("DAO_ADDRESS")?;

        let chain_id: u64 = lookup("CHAIN_ID")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let rpc_url = lookup("RPC_URL").unwrap_or_else(|| match chain_id {
            100 => "https://rpc.gnosischain.com".to_string(),
            137 => "https://polygon-rpc.com".to_string(),
            _ => "https://cloudflare-eth.com".to_string(),
        });

        let graph_url = lookup("GRAPH_URL")
            .unwrap_or_else(|| "https://api.thegraph.com/subgraphs/name/molochventures/moloch".to_string());
        let graph_url = Url::parse(&graph_url).context("GRAPH_URL")?;

        let guild_bank_address = optional_address(&lookup, "GUILD_BANK_ADDRESS")?;
        let token_address = optional_address(&lookup, "TOKEN_ADDRESS")?;

        let token_decimals: u32 = lookup("TOKEN_DECIMALS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(18);
        let from_block: u64 = lookup("FROM_BLOCK")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let poll_secs: u64 = lookup("POLL_INTERVAL_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|s| *s > 0)
            .unwrap_or(20);

        let price_api_url = lookup("PRICE_API_URL")
            .unwrap_or_else(|| "https://api.coingecko.com/api/v3/simple/token_price/ethereum".to_string());
        let price_api_url = Url::parse(&price_api_url).context("PRICE_API_URL")?;
        let token_list_url = lookup("TOKEN_LIST_URL")
            .unwrap_or_else(|| "https://tokens.coingecko.com/uniswap/all.json".to_string());
        let token_list_url = Url::parse(&token_list_url).context("TOKEN_LIST_URL")?;

        let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let output_path = lookup("OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join("data").join("series.json"));

        Ok(Config {
            dao_address,
            chain_id,
            rpc_url,
            graph_url,
            guild_bank_address,
            token_address,
            token_decimals,
            from_block,
            poll_interval: Duration::from_secs(poll_secs),
            price_api_url,
            token_list_url,
            output_path,
        })
    }
}

fn optional_address<F>(lookup: &F, key: &str) -> Result<Option<Address>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|s| !s.trim().is_empty()) {
        Some(s) => Ok(Some(address_from_hex(&s).with_context(|| key.to_string())?)),
        None => Ok(None),
    }
}
