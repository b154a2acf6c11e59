//! USD quotes for the guild bank's tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use url::Url;

use crate::chain::Network;
use crate::error::{Error, Result};
use crate::graph::TokenBalance;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsdQuote {
    pub usd: f64,
}

/// Quotes keyed by lowercase token address.
pub type Quotes = HashMap<String, UsdQuote>;

#[derive(Debug, Clone, Deserialize)]
pub struct ListedToken {
    #[serde(rename = "chainId", default = "mainnet_chain")]
    pub chain_id: u64,
    pub address: String,
    pub symbol: String,
}

fn mainnet_chain() -> u64 {
    1
}

#[derive(Deserialize)]
struct TokenList {
    tokens: Vec<ListedToken>,
}

#[derive(Clone)]
pub struct PriceClient {
    price_api_url: Url,
    token_list_url: Url,
    http: reqwest::Client,
}

impl PriceClient {
    pub fn new(price_api_url: Url, token_list_url: Url) -> Self {
        Self { price_api_url, token_list_url, http: reqwest::Client::new() }
    }

    pub async fn usd_quotes(&self, addresses: &[String]) -> Result<Quotes> {
        if addresses.is_empty() {
            return Ok(Quotes::new());
        }
        let mut url = self.price_api_url.clone();
        url.query_pairs_mut()
            .append_pair("contract_addresses", &addresses.join(","))
            .append_pair("vs_currencies", "usd");
        let res = self.http.get(url.clone()).send().await?;
        if !res.status().is_success() {
            return Err(Error::Status { status: res.status().as_u16(), url: url.to_string() });
        }
        let quotes: Quotes = res.json().await?;
        Ok(quotes.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect())
    }

    /// Symbol -> lowercase mainnet address.
    pub async fn mainnet_addresses(&self) -> Result<HashMap<String, String>> {
        let list: TokenList = self.http.get(self.token_list_url.clone()).send().await?.json().await?;
        Ok(symbol_map(&list.tokens))
    }

    /// Quotes for `balances`, keyed by the local network's token addresses.
    pub async fn quotes_for(&self, network: &Network, balances: &[TokenBalance]) -> Result<Quotes> {
        if network.is_mainnet() {
            let addresses: Vec<String> = balances.iter().map(|b| b.token.token_address.to_lowercase()).collect();
            return self.usd_quotes(&addresses).await;
        }
        let symbols = self.mainnet_addresses().await?;
        let (mainnet, local_by_mainnet) = remap_to_mainnet(&symbols, balances);
        let quotes = self.usd_quotes(&mainnet).await?;
        Ok(remap_quotes(quotes, &local_by_mainnet))
    }
}

fn symbol_map(tokens: &[ListedToken]) -> HashMap<String, String> {
    tokens
        .iter()
        .filter(|t| t.chain_id == 1)
        .map(|t| (t.symbol.clone(), t.address.to_lowercase()))
        .collect()
}

/// Mainnet addresses to quote plus the way back to local addresses.
/// Tokens whose symbol has no mainnet listing are dropped.
pub fn remap_to_mainnet(
    symbols: &HashMap<String, String>,
    balances: &[TokenBalance],
) -> (Vec<String>, HashMap<String, String>) {
    let mut mainnet = Vec::new();
    let mut local_by_mainnet = HashMap::new();
    for balance in balances {
        if let Some(addr) = symbols.get(&balance.token.symbol) {
            local_by_mainnet.insert(addr.clone(), balance.token.token_address.to_lowercase());
            mainnet.push(addr.clone());
        }
    }
    (mainnet, local_by_mainnet)
}

pub fn remap_quotes(quotes: Quotes, local_by_mainnet: &HashMap<String, String>) -> Quotes {
    quotes
        .into_iter()
        .filter_map(|(addr, quote)| local_by_mainnet.get(&addr.to_lowercase()).map(|local| (local.clone(), quote)))
        .collect()
}

/// Last known quotes. A failed refresh leaves them as they were and marks the
/// book for another attempt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceBook {
    pub quotes: Quotes,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    last_failed: bool,
}

impl PriceBook {
    pub fn usd(&self, token_address: &str) -> Option<f64> {
        self.quotes.get(&token_address.to_lowercase()).map(|q| q.usd)
    }

    /// True until one fetch succeeds, and again after any failed fetch.
    pub fn needs_refresh(&self) -> bool {
        self.updated_at.is_none() || self.last_failed
    }

    pub fn apply(&mut self, result: Result<Quotes>) -> bool {
        match result {
            Ok(quotes) => {
                info!("prices updated for {} tokens", quotes.len());
                self.quotes = quotes;
                self.updated_at = Some(Utc::now());
                self.last_failed = false;
                true
            }
            Err(e) => {
                warn!("price fetch err: {}", e);
                self.last_failed = true;
                false
            }
        }
    }

    pub async fn refresh(&mut self, client: &PriceClient, network: &Network, balances: &[TokenBalance]) -> bool {
        let result = client.quotes_for(network, balances).await;
        self.apply(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Token;

    fn balance(addr: &str, symbol: &str) -> TokenBalance {
        TokenBalance {
            token: Token { token_address: addr.into(), symbol: symbol.into(), decimals: "18".into() },
            token_balance: "0".into(),
        }
    }

    #[test]
    fn testnet_tokens_are_quoted_through_mainnet() {
        let symbols = symbol_map(&[
            ListedToken { chain_id: 1, address: "0xMAIN_DAI".into(), symbol: "DAI".into() },
            ListedToken { chain_id: 137, address: "0xPOLY_DAI".into(), symbol: "USDC".into() },
        ]);
        let balances = [balance("0xXDAI_DAI", "DAI"), balance("0xXDAI_USDC", "USDC")];
        let (mainnet, back) = remap_to_mainnet(&symbols, &balances);
        assert_eq!(mainnet, vec!["0xmain_dai".to_string()]);

        let quotes: Quotes = [("0xMAIN_DAI".to_string(), UsdQuote { usd: 1.001 })].into_iter().collect();
        let local = remap_quotes(quotes, &back);
        assert_eq!(local.get("0xxdai_dai"), Some(&UsdQuote { usd: 1.001 }));
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn failed_refresh_keeps_stale_prices() {
        let mut book = PriceBook::default();
        assert!(book.apply(Ok([("0xabc".to_string(), UsdQuote { usd: 2.5 })].into_iter().collect())));
        let stamp = book.updated_at;

        assert!(!book.apply(Err(Error::Graph("down".into()))));
        assert_eq!(book.usd("0xABC"), Some(2.5));
        assert_eq!(book.updated_at, stamp);
    }

    #[test]
    fn failed_fetch_is_retried() {
        let mut book = PriceBook::default();
        assert!(book.needs_refresh());

        book.apply(Err(Error::Graph("down".into())));
        assert!(book.needs_refresh());

        book.apply(Ok(Quotes::new()));
        assert!(!book.needs_refresh());

        book.apply(Err(Error::Graph("down again".into())));
        assert!(book.needs_refresh());
    }

    #[test]
    fn parses_price_payload() {
        let quotes: Quotes = serde_json::from_str(r#"{"0x6b17":{"usd":0.999}}"#).unwrap();
        assert_eq!(quotes["0x6b17"].usd, 0.999);
    }
}
