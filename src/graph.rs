//! Aggregate DAO metadata from the GraphQL indexer.

use ethers::types::Address;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::events::{scale_amount, trim_zeros};

const METADATA_QUERY: &str = r#"
query daoMetadata($id: ID!) {
  moloch(id: $id) {
    totalShares
    guildBankAddress
    tokenBalances(where: { guildBank: true }) {
      token { tokenAddress symbol decimals }
      tokenBalance
    }
  }
}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token_address: String,
    pub symbol: String,
    pub decimals: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub token: Token,
    /// Base units, as the indexer returns them.
    pub token_balance: String,
}

impl TokenBalance {
    pub fn amount(&self) -> Option<BigDecimal> {
        let raw = ethers::types::U256::from_dec_str(&self.token_balance).ok()?;
        let decimals = self.token.decimals.parse().ok()?;
        Some(scale_amount(raw, decimals))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoMetadata {
    pub total_shares: String,
    pub guild_bank_address: String,
    pub token_balances: Vec<TokenBalance>,
}

impl DaoMetadata {
    pub fn total_shares(&self) -> BigDecimal {
        BigDecimal::from_str(&self.total_shares).unwrap_or_else(|_| BigDecimal::zero())
    }

    /// Guild bank holdings of `token`, in display units.
    pub fn guild_bank_value(&self, token: Address) -> BigDecimal {
        let wanted = format!("{:?}", token);
        self.token_balances
            .iter()
            .find(|b| b.token.token_address.to_lowercase() == wanted)
            .and_then(TokenBalance::amount)
            .unwrap_or_else(BigDecimal::zero)
    }

    /// Bank value per share; zero while no shares exist.
    pub fn share_value(&self, token: Address) -> BigDecimal {
        let shares = self.total_shares();
        if shares.is_zero() {
            return BigDecimal::zero();
        }
        trim_zeros(self.guild_bank_value(token) / shares)
    }
}

#[derive(Serialize)]
struct GraphRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphError>>,
}

#[derive(Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Deserialize)]
struct MolochData {
    moloch: Option<DaoMetadata>,
}

#[derive(Clone)]
pub struct GraphClient {
    url: Url,
    http: reqwest::Client,
}

impl GraphClient {
    pub fn new(url: Url) -> Self {
        Self { url, http: reqwest::Client::new() }
    }

    pub async fn dao_metadata(&self, dao: Address) -> Result<DaoMetadata> {
        let body = GraphRequest {
            query: METADATA_QUERY,
            variables: serde_json::json!({ "id": format!("{:?}", dao) }),
        };
        let res = self.http.post(self.url.clone()).json(&body).send().await?;
        if !res.status().is_success() {
            return Err(Error::Status { status: res.status().as_u16(), url: self.url.to_string() });
        }
        let text = res.text().await?;
        debug!("graph response: {} bytes", text.len());
        parse_metadata(&text)
    }
}

fn parse_metadata(body: &str) -> Result<DaoMetadata> {
    let parsed: GraphResponse<MolochData> = serde_json::from_str(body)?;
    if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(Error::Graph(messages.join("; ")));
    }
    parsed
        .data
        .and_then(|d| d.moloch)
        .ok_or_else(|| Error::Graph("dao not indexed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    fn body() -> &'static str {
        r#"{"data":{"moloch":{
            "totalShares":"400",
            "guildBankAddress":"0x83ab8e31df35aa3281d630529c6f4bf5ac7f7abf",
            "tokenBalances":[
                {"token":{"tokenAddress":"0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2","symbol":"WETH","decimals":"18"},
                 "tokenBalance":"1200000000000000000000"}
            ]}}}"#
    }

    #[test]
    fn derives_bank_and_share_value() {
        let meta = parse_metadata(body()).unwrap();
        let weth: Address = WETH.parse().unwrap();
        assert_eq!(meta.total_shares(), BigDecimal::from(400));
        assert_eq!(meta.guild_bank_value(weth), BigDecimal::from(1200));
        assert_eq!(meta.share_value(weth), BigDecimal::from(3));
        assert_eq!(meta.guild_bank_value(Address::zero()), BigDecimal::zero());
    }

    #[test]
    fn no_shares_means_zero_value() {
        let mut meta = parse_metadata(body()).unwrap();
        meta.total_shares = "0".into();
        assert_eq!(meta.share_value(WETH.parse().unwrap()), BigDecimal::zero());
    }

    #[test]
    fn graph_errors_surface() {
        let err = parse_metadata(r#"{"errors":[{"message":"bad query"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Graph(m) if m == "bad query"));
        let err = parse_metadata(r#"{"data":{"moloch":null}}"#).unwrap_err();
        assert!(matches!(err, Error::Graph(_)));
    }
}
