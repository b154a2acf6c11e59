#![allow(dead_code)]

use async_trait::async_trait;
use dao_series::chain::{BlockRange, DaoEvent, DecodedLog, LogQuery, LogSource, TransferFilter};
use dao_series::{DaoContext, Error, Result};
use ethers::abi::Token;
use ethers::types::{Address, U256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const WAD: u128 = 1_000_000_000_000_000_000;

pub fn dao() -> Address {
    Address::from_low_u64_be(0xda0)
}

pub fn bank() -> Address {
    Address::from_low_u64_be(0xba4c)
}

pub fn token() -> Address {
    Address::from_low_u64_be(0x7e4)
}

pub fn context() -> DaoContext {
    DaoContext {
        dao: dao(),
        guild_bank: bank(),
        token: token(),
        token_decimals: 18,
        range: BlockRange::from_block(1),
    }
}

pub fn proposal(block: u64, shares: u64, passed: bool) -> DecodedLog {
    DecodedLog {
        block_number: block,
        params: vec![
            ("proposalIndex".into(), Token::Uint(U256::zero())),
            ("sharesRequested".into(), Token::Uint(U256::from(shares))),
            ("didPass".into(), Token::Bool(passed)),
        ],
    }
}

pub fn ragequit(block: u64, shares: u64) -> DecodedLog {
    DecodedLog {
        block_number: block,
        params: vec![
            ("memberAddress".into(), Token::Address(Address::from_low_u64_be(1))),
            ("sharesToBurn".into(), Token::Uint(U256::from(shares))),
        ],
    }
}

pub fn transfer(block: u64, wad: u128) -> DecodedLog {
    transfer_units(block, U256::from(wad))
}

pub fn transfer_units(block: u64, wad: U256) -> DecodedLog {
    DecodedLog { block_number: block, params: vec![("wad".into(), Token::Uint(wad))] }
}

/// In-memory logs keyed by event and transfer direction.
#[derive(Default, Clone)]
pub struct FakeSource {
    pub proposals: Vec<DecodedLog>,
    pub ragequits: Vec<DecodedLog>,
    pub deposits: Vec<DecodedLog>,
    pub withdrawals: Vec<DecodedLog>,
    pub fail_on: Option<DaoEvent>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSource for FakeSource {
    async fn logs(&self, query: &LogQuery) -> Result<Vec<DecodedLog>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(query.event) {
            return Err(Error::Graph(format!("{} unavailable", query.event.name())));
        }
        let logs = match (query.event, query.filter) {
            (DaoEvent::ProcessProposal, _) => &self.proposals,
            (DaoEvent::Ragequit, _) => &self.ragequits,
            (DaoEvent::Transfer, Some(TransferFilter::To(_))) => &self.deposits,
            (DaoEvent::Transfer, Some(TransferFilter::From(_))) => &self.withdrawals,
            (DaoEvent::Transfer, None) => return Ok(Vec::new()),
        };
        Ok(logs.iter().filter(|l| query.range.contains(l.block_number)).cloned().collect())
    }

    async fn latest_block(&self) -> Result<u64> {
        Ok(1_000)
    }
}
