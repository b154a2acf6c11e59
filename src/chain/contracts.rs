use super::{DaoEvent, DecodedLog, LogQuery, LogSource, TransferFilter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use ethers::abi::{parse_abi, RawLog};
use ethers::prelude::*;
use ethers::types::{Address, Bytes, H256};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Reads and decodes DAO logs over an HTTP JSON-RPC provider.
#[derive(Clone)]
pub struct EthLogSource {
    provider: Provider<Http>,
    events: HashMap<DaoEvent, ethers::abi::Event>,
}

impl EthLogSource {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        Self::with_provider(provider)
    }

    pub fn with_provider(provider: Provider<Http>) -> Result<Self> {
        let mut events = HashMap::new();
        for event in [DaoEvent::ProcessProposal, DaoEvent::Ragequit, DaoEvent::Transfer] {
            let abi = parse_abi(&[event.abi()]).map_err(|e| Error::AbiParse(e.to_string()))?;
            events.insert(event, abi.event(event.name())?.clone());
        }
        Ok(Self { provider, events })
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }

    fn filter(&self, query: &LogQuery, abi: &ethers::abi::Event) -> Filter {
        let to_block = match query.range.to {
            Some(to) => BlockNumber::Number(to.into()),
            None => BlockNumber::Latest,
        };
        let filter = Filter::new()
            .address(query.address)
            .topic0(abi.signature())
            .from_block(BlockNumber::Number(query.range.from.into()))
            .to_block(to_block);
        // Transfer(src indexed, dst indexed, wad)
        match query.filter {
            Some(TransferFilter::From(src)) => filter.topic1(H256::from(src)),
            Some(TransferFilter::To(dst)) => filter.topic2(H256::from(dst)),
            None => filter,
        }
    }
}

#[async_trait]
impl LogSource for EthLogSource {
    async fn logs(&self, query: &LogQuery) -> Result<Vec<DecodedLog>> {
        let abi = self
            .events
            .get(&query.event)
            .ok_or_else(|| Error::AbiParse(format!("no ABI for {}", query.event.name())))?;
        let filter = self.filter(query, abi);
        let logs = self.provider.get_logs(&filter).await?;
        debug!("{} {} logs from {:?}", logs.len(), query.event.name(), query.address);

        let mut decoded = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(block) = log.block_number else {
                warn!("skipping pending {} log", query.event.name());
                continue;
            };
            let raw = RawLog { topics: log.topics.clone(), data: log.data.to_vec() };
            let parsed = abi.parse_log(raw)?;
            decoded.push(DecodedLog {
                block_number: block.as_u64(),
                params: parsed.params.into_iter().map(|p| (p.name, p.value)).collect(),
            });
        }
        Ok(decoded)
    }

    async fn latest_block(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }
}

pub fn address_from_hex(s: &str) -> Result<Address> {
    let trimmed = s.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).map_err(|_| Error::InvalidAddress(s.to_string()))?;
    if bytes.len() != 20 {
        return Err(Error::InvalidAddress(s.to_string()));
    }
    Ok(Address::from_slice(&bytes))
}

/// `guildBank()` on a Moloch v1 DAO.
pub async fn read_guild_bank(provider: &Provider<Http>, dao: Address) -> Result<Address> {
    call_address(provider, dao, "guildBank()").await
}

/// `approvedToken()` on a Moloch v1 DAO.
pub async fn read_approved_token(provider: &Provider<Http>, dao: Address) -> Result<Address> {
    call_address(provider, dao, "approvedToken()").await
}

async fn call_address(provider: &Provider<Http>, target: Address, signature: &'static str) -> Result<Address> {
    let selector = ethers::utils::id(signature);
    let tx = TransactionRequest::default()
        .to(target)
        .data(Bytes::from(selector.to_vec()));
    let res = provider.call(&tx.into(), None).await?;
    word_to_address(&res).ok_or(Error::BadReturnData { call: signature, len: res.len() })
}

fn word_to_address(word: &[u8]) -> Option<Address> {
    if word.len() < 32 {
        return None;
    }
    Some(Address::from_slice(&word[12..32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BlockRange;
    use ethers::types::FilterBlockOption;

    #[test]
    fn parses_addresses() {
        let a = address_from_hex("0x64A51A8bA4D4E1fBB6F5B4d1D6e7F2a3B8c9d0E1").unwrap();
        assert_eq!(format!("{:?}", a), "0x64a51a8ba4d4e1fbb6f5b4d1d6e7f2a3b8c9d0e1");
        assert!(address_from_hex("0x1234").is_err());
        assert!(address_from_hex("not-hex").is_err());
    }

    #[test]
    fn address_from_return_word() {
        let mut word = [0u8; 32];
        word[31] = 0xaa;
        assert_eq!(word_to_address(&word).unwrap(), Address::from_low_u64_be(0xaa));
        assert!(word_to_address(&word[..20]).is_none());
    }

    #[test]
    fn event_signatures_match_topics() {
        let source = EthLogSource::new("http://localhost:8545").unwrap();
        let transfer = &source.events[&DaoEvent::Transfer];
        assert_eq!(
            transfer.signature(),
            H256::from(ethers::utils::keccak256("Transfer(address,address,uint256)"))
        );
        let ragequit = &source.events[&DaoEvent::Ragequit];
        assert_eq!(ragequit.signature(), H256::from(ethers::utils::keccak256("Ragequit(address,uint256)")));
    }

    fn transfer_query(filter: TransferFilter, range: BlockRange) -> LogQuery {
        LogQuery { address: Address::from_low_u64_be(0x7e4), event: DaoEvent::Transfer, filter: Some(filter), range }
    }

    #[test]
    fn withdrawals_match_the_source_topic() {
        let source = EthLogSource::new("http://localhost:8545").unwrap();
        let abi = &source.events[&DaoEvent::Transfer];
        let bank = Address::from_low_u64_be(0xba4c);
        let filter = source.filter(&transfer_query(TransferFilter::From(bank), BlockRange::from_block(7)), abi);

        assert_eq!(filter.topics[0], Some(abi.signature().into()));
        assert_eq!(filter.topics[1], Some(H256::from(bank).into()));
        assert_eq!(filter.topics[2], None);
        assert_eq!(&H256::from(bank).as_bytes()[12..], bank.as_bytes());
        match filter.block_option {
            FilterBlockOption::Range { from_block, to_block } => {
                assert_eq!(from_block, Some(BlockNumber::Number(7u64.into())));
                assert_eq!(to_block, Some(BlockNumber::Latest));
            }
            other => panic!("unexpected block option {:?}", other),
        }
    }

    #[test]
    fn deposits_match_the_destination_topic() {
        let source = EthLogSource::new("http://localhost:8545").unwrap();
        let abi = &source.events[&DaoEvent::Transfer];
        let bank = Address::from_low_u64_be(0xba4c);
        let range = BlockRange { from: 3, to: Some(90) };
        let filter = source.filter(&transfer_query(TransferFilter::To(bank), range), abi);

        assert_eq!(filter.topics[1], None);
        assert_eq!(filter.topics[2], Some(H256::from(bank).into()));
        assert_eq!(filter.address, Some(ValueOrArray::Value(Address::from_low_u64_be(0x7e4))));
        match filter.block_option {
            FilterBlockOption::Range { from_block, to_block } => {
                assert_eq!(from_block, Some(BlockNumber::Number(3u64.into())));
                assert_eq!(to_block, Some(BlockNumber::Number(90u64.into())));
            }
            other => panic!("unexpected block option {:?}", other),
        }
    }
}
