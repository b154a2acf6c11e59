mod contracts;

pub use contracts::{address_from_hex, read_approved_token, read_guild_bank, EthLogSource};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, U256};

use crate::error::Result;

/// Events the dashboard reads. Moloch v1 governance events plus the
/// WETH-style `Transfer` emitted by the approved token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaoEvent {
    ProcessProposal,
    Ragequit,
    Transfer,
}

impl DaoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DaoEvent::ProcessProposal => "ProcessProposal",
            DaoEvent::Ragequit => "Ragequit",
            DaoEvent::Transfer => "Transfer",
        }
    }

    pub fn abi(&self) -> &'static str {
        match self {
            DaoEvent::ProcessProposal => "event ProcessProposal(uint256 indexed proposalIndex, address indexed applicant, address indexed memberAddress, uint256 tokenTribute, uint256 sharesRequested, bool didPass)",
            DaoEvent::Ragequit => "event Ragequit(address indexed memberAddress, uint256 sharesToBurn)",
            DaoEvent::Transfer => "event Transfer(address indexed src, address indexed dst, uint256 wad)",
        }
    }
}

/// Side of a token transfer to match against the guild bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFilter {
    /// `dst == address`: a deposit.
    To(Address),
    /// `src == address`: a withdrawal.
    From(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    /// `None` reads up to the latest block.
    pub to: Option<u64>,
}

impl BlockRange {
    pub fn from_block(from: u64) -> Self {
        Self { from, to: None }
    }

    pub fn contains(&self, block: u64) -> bool {
        block >= self.from && self.to.map_or(true, |to| block <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event: DaoEvent,
    pub filter: Option<TransferFilter>,
    pub range: BlockRange,
}

/// A log decoded against its event ABI, parameters keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub block_number: u64,
    pub params: Vec<(String, Token)>,
}

impl DecodedLog {
    pub fn param(&self, name: &str) -> Option<&Token> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn uint(&self, name: &str) -> Option<U256> {
        match self.param(name)? {
            Token::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.param(name)? {
            Token::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Where raw event logs come from.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn logs(&self, query: &LogQuery) -> Result<Vec<DecodedLog>>;

    async fn latest_block(&self) -> Result<u64>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub name: &'static str,
}

impl Network {
    pub fn is_mainnet(&self) -> bool {
        self.chain_id == 1
    }
}

pub fn get_network(chain_id: u64) -> Option<Network> {
    let name = match chain_id {
        1 => "mainnet",
        4 => "rinkeby",
        42 => "kovan",
        100 => "xdai",
        137 => "matic",
        _ => return None,
    };
    Some(Network { chain_id, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_networks() {
        assert!(get_network(1).unwrap().is_mainnet());
        assert_eq!(get_network(100).unwrap().name, "xdai");
        assert!(get_network(31337).is_none());
    }

    #[test]
    fn range_bounds() {
        let open = BlockRange::from_block(10);
        assert!(open.contains(10) && open.contains(u64::MAX));
        assert!(!open.contains(9));
        let closed = BlockRange { from: 10, to: Some(20) };
        assert!(!closed.contains(21));
    }

    #[test]
    fn typed_accessors() {
        let log = DecodedLog {
            block_number: 1,
            params: vec![
                ("wad".into(), Token::Uint(U256::from(7))),
                ("didPass".into(), Token::Bool(true)),
            ],
        };
        assert_eq!(log.uint("wad"), Some(U256::from(7)));
        assert_eq!(log.flag("didPass"), Some(true));
        assert_eq!(log.uint("didPass"), None);
    }
}
