use snafu::Snafu;

/// errors from parsing a decimal token amount or doing wei arithmetic
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum AmountError {
    #[snafu(display("amount is empty"))]
    EmptyAmount,

    #[snafu(display("amount {} contains a non-digit character", value))]
    InvalidDigit { value: String },

    #[snafu(display("amount {} has more than {} decimal places", value, decimals))]
    TooPrecise { value: String, decimals: u32 },

    #[snafu(display("amount overflows 256 bits"))]
    Overflow,
}

/// errors from parsing a hex address
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum AddressError {
    #[snafu(display("address is not valid hex: {}", source))]
    AddressHex { source: hex::FromHexError },

    #[snafu(display("address must be 20 bytes, got {}", len))]
    AddressLength { len: usize },
}

/// errors from building a Config
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("invalid contract address {}: {}", value, source))]
    InvalidAddress { value: String, source: AddressError },

    #[snafu(display("invalid fallback price {}: {}", value, source))]
    InvalidPrice { value: String, source: AmountError },

    #[snafu(display("{} must be an unsigned integer, got {}", key, value))]
    InvalidNumber { key: String, value: String },

    #[snafu(display("rpc url must not be empty"))]
    MissingRpcUrl,

    #[snafu(display("could not parse config document: {}", source))]
    ParseConfig { source: serde_json::Error },
}

/// errors from a read-only contract call
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ChainError {
    #[snafu(display("call reverted: {}", message))]
    Reverted { message: String },

    #[snafu(display("contract returned no data"))]
    EmptyReturn,

    #[snafu(display("malformed return data: {}", reason))]
    Decode { reason: String },

    #[snafu(display("rpc request failed: {}", source))]
    Transport { source: reqwest::Error },

    #[snafu(display("rpc error {}: {}", code, message))]
    Rpc { code: i64, message: String },

    #[snafu(display("rpc json error: {}", source))]
    RpcJson { source: serde_json::Error },
}

/// errors surfaced by a wallet connector or signer
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum WalletError {
    #[snafu(display("no wallet found"))]
    NoWallet,

    #[snafu(display("user rejected the request"))]
    Rejected,

    #[snafu(display("transaction reverted: {}", message))]
    TxReverted { message: String },

    #[snafu(display("gas estimation failed: {}", message))]
    Estimation { message: String },

    #[snafu(display("wallet error {}: {}", code, message))]
    Provider { code: i64, message: String },
}

/// errors from resolving token metadata
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MetadataError {
    #[snafu(display("metadata request failed: {}", source))]
    Http { source: reqwest::Error },

    #[snafu(display("metadata host answered {} with status {}", url, status))]
    HttpStatus { url: String, status: u16 },

    #[snafu(display("nothing found at {}", url))]
    NotFound { url: String },

    #[snafu(display("invalid data uri: {}", reason))]
    DataUri { reason: String },

    #[snafu(display("invalid metadata document: {}", source))]
    Json { source: serde_json::Error },

    #[snafu(display("metadata document has no image"))]
    NoImage,
}
