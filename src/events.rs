//! Normalization of decoded chain logs into signed [`Event`]s.

use bigdecimal::num_bigint::{BigInt, Sign as BigSign};
use bigdecimal::BigDecimal;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::chain::DecodedLog;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Mint,
    Burn,
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Additive,
    Subtractive,
}

impl EventKind {
    pub fn sign(&self) -> Sign {
        match self {
            EventKind::Mint | EventKind::Deposit => Sign::Additive,
            EventKind::Burn | EventKind::Withdraw => Sign::Subtractive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub amount: BigDecimal,
    pub block_number: u64,
}

/// How to turn one category of logs into events.
#[derive(Debug, Clone)]
pub struct NormalizeRule {
    pub kind: EventKind,
    /// Name of the uint parameter carrying the amount.
    pub field: &'static str,
    /// Base-unit exponent: 0 for share counts, token decimals for balances.
    pub decimals: u32,
}

impl NormalizeRule {
    pub fn minted_shares() -> Self {
        Self { kind: EventKind::Mint, field: "sharesRequested", decimals: 0 }
    }

    pub fn burned_shares() -> Self {
        Self { kind: EventKind::Burn, field: "sharesToBurn", decimals: 0 }
    }

    pub fn deposits(decimals: u32) -> Self {
        Self { kind: EventKind::Deposit, field: "wad", decimals }
    }

    pub fn withdrawals(decimals: u32) -> Self {
        Self { kind: EventKind::Withdraw, field: "wad", decimals }
    }
}

/// Maps every log to an [`Event`], scaled to display units and signed by the
/// rule's kind. An empty slice yields an empty vector.
pub fn normalize(logs: &[DecodedLog], rule: &NormalizeRule) -> Result<Vec<Event>> {
    logs.iter()
        .map(|log| {
            let raw = log.uint(rule.field).ok_or_else(|| Error::MissingField {
                field: rule.field.to_string(),
                block: log.block_number,
            })?;
            let amount = scale_amount(raw, rule.decimals);
            let amount = match rule.kind.sign() {
                Sign::Additive => amount,
                Sign::Subtractive => -amount,
            };
            Ok(Event { kind: rule.kind, amount, block_number: log.block_number })
        })
        .collect()
}

/// Keeps the `ProcessProposal` logs that passed; failed proposals mint nothing.
pub fn passed_proposals(logs: &[DecodedLog]) -> Vec<DecodedLog> {
    logs.iter().filter(|log| log.flag("didPass").unwrap_or(false)).cloned().collect()
}

/// Converts a base-unit integer into a decimal with `decimals` fractional
/// digits. Any `U256` is representable.
pub fn scale_amount(raw: U256, decimals: u32) -> BigDecimal {
    let mut bytes = [0u8; 32];
    raw.to_big_endian(&mut bytes);
    let int = BigInt::from_bytes_be(BigSign::Plus, &bytes);
    trim_zeros(BigDecimal::new(int, i64::from(decimals)))
}

/// Drops trailing fractional zeros without going to a negative scale.
pub fn trim_zeros(value: BigDecimal) -> BigDecimal {
    let normalized = value.normalized();
    if normalized.as_bigint_and_exponent().1 < 0 {
        normalized.with_scale(0)
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::Token;

    fn log(block: u64, params: Vec<(&str, Token)>) -> DecodedLog {
        DecodedLog {
            block_number: block,
            params: params.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    #[test]
    fn burns_are_negated() {
        let logs = vec![log(20, vec![("sharesToBurn", Token::Uint(U256::from(2)))])];
        let events = normalize(&logs, &NormalizeRule::burned_shares()).unwrap();
        assert_eq!(events, vec![Event { kind: EventKind::Burn, amount: BigDecimal::from(-2), block_number: 20 }]);
    }

    #[test]
    fn wad_is_scaled_from_wei() {
        let wei = U256::from(1_500_000_000_000_000_000u128);
        let logs = vec![log(5, vec![("wad", Token::Uint(wei))])];
        let events = normalize(&logs, &NormalizeRule::deposits(18)).unwrap();
        assert_eq!(events[0].amount, BigDecimal::new(15.into(), 1));
        assert_eq!(events[0].amount.to_string(), "1.5");
    }

    #[test]
    fn empty_input_is_not_an_error() {
        assert!(normalize(&[], &NormalizeRule::withdrawals(18)).unwrap().is_empty());
    }

    #[test]
    fn missing_field_is_reported() {
        let logs = vec![log(7, vec![("wad", Token::Uint(U256::one()))])];
        let err = normalize(&logs, &NormalizeRule::minted_shares()).unwrap_err();
        assert!(matches!(err, Error::MissingField { block: 7, .. }));
    }

    #[test]
    fn amounts_beyond_96_bits_are_kept() {
        let wad = U256::exp10(29);
        let logs = vec![log(5, vec![("wad", Token::Uint(wad))])];
        let events = normalize(&logs, &NormalizeRule::deposits(18)).unwrap();
        assert_eq!(events[0].amount, BigDecimal::from(100_000_000_000i64));
        assert_eq!(events[0].amount.to_string(), "100000000000");
    }

    #[test]
    fn full_u256_range_scales() {
        let max = scale_amount(U256::max_value(), 0);
        assert_eq!(max.to_string(), U256::max_value().to_string());
        assert_eq!(scale_amount(U256::one(), 40), BigDecimal::new(1.into(), 40));
    }

    #[test]
    fn only_passed_proposals_are_kept() {
        let logs = vec![
            log(1, vec![("sharesRequested", Token::Uint(U256::from(3))), ("didPass", Token::Bool(true))]),
            log(2, vec![("sharesRequested", Token::Uint(U256::from(9))), ("didPass", Token::Bool(false))]),
        ];
        let passed = passed_proposals(&logs);
        assert_eq!(passed.len(), 1);
        assert_eq!(passed[0].block_number, 1);
    }
}
