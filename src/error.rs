use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("provider: {0}")]
    Provider(#[from] ethers::providers::ProviderError),
    #[error("abi: {0}")]
    Abi(#[from] ethers::abi::Error),
    #[error("abi parse: {0}")]
    AbiParse(String),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("log at block {block} has no `{field}` parameter")]
    MissingField { field: String, block: u64 },
    #[error("{call} returned {len} bytes")]
    BadReturnData { call: &'static str, len: usize },
    #[error("graph query failed: {0}")]
    Graph(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}
