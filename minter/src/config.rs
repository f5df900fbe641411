use std::time::Duration;

use primitive_types::U256;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};

use crate::abi::{parse_address, Address};
use crate::error::{
    ConfigError, InvalidAddressSnafu, InvalidNumberSnafu, InvalidPriceSnafu, MissingRpcUrlSnafu,
    ParseConfigSnafu,
};
use crate::units::parse_ether;

/// default collection contract
pub const DEFAULT_CONTRACT: &str = "0x6a0DbB7e447B8f681afbe5ec8b1573e6FaFf7ba2";
/// Base mainnet chain id
pub const DEFAULT_CHAIN_ID: u64 = 8453;
/// public Base mainnet RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
/// gateway used to rewrite `ipfs://` URIs
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.thirdwebcdn.com/ipfs/";
/// payment attached when the contract exposes no price, in ether
pub const DEFAULT_FALLBACK_PRICE: &str = "0.0003";
/// image shown when the contract metadata yields none
pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://ipfs.thirdwebcdn.com/ipfs/QmZWe632bsbtXN33xcFr11UEFppWsViX9G8Ppo4CnCnkep/0.png";
/// seconds an RPC or metadata request may take before it is abandoned
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// prefix of the environment variables read by `RawConfig::apply_vars`
pub const ENV_PREFIX: &str = "MINT_";

/// metadata describing the dapp to wallet connectors
#[derive(Serialize, Deserialize, JsonSchema, Clone, PartialEq, Debug)]
pub struct AppMetadata {
    /// name shown in the wallet prompt
    pub name: String,
    /// short description
    pub description: String,
    /// url of the mint page
    pub url: String,
    /// icon urls
    pub icons: Vec<String>,
}

impl Default for AppMetadata {
    fn default() -> Self {
        AppMetadata {
            name: "JessePunk Mint".to_string(),
            description: "Mint your JessePunk NFT".to_string(),
            url: "https://d225.vercel.app".to_string(),
            icons: vec!["https://avatars.githubusercontent.com/u/37784886".to_string()],
        }
    }
}

/// deployment settings as written in a config document or the environment
#[derive(Serialize, Deserialize, JsonSchema, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct RawConfig {
    /// hex address of the collection contract
    pub contract_address: String,
    /// chain the contract lives on
    pub chain_id: u64,
    /// JSON-RPC endpoint used for read-only calls
    pub rpc_url: String,
    /// wallet connection project identifier
    pub project_id: String,
    /// HTTP gateway prefix for `ipfs://` URIs
    pub ipfs_gateway: String,
    /// payment in ether attached when the contract price is unknown
    pub fallback_price: String,
    /// image shown when none can be resolved from metadata
    pub fallback_image: Option<String>,
    /// token whose metadata supplies the display image
    pub metadata_token_id: u64,
    /// token id passed to drop-style `claimTo`
    pub claim_token_id: u64,
    /// seconds before an RPC or metadata request is abandoned
    pub request_timeout_secs: u64,
    /// dapp description handed to wallet connectors
    pub app: AppMetadata,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            contract_address: DEFAULT_CONTRACT.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            project_id: String::new(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            fallback_price: DEFAULT_FALLBACK_PRICE.to_string(),
            fallback_image: Some(DEFAULT_FALLBACK_IMAGE.to_string()),
            metadata_token_id: 0,
            claim_token_id: 0,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            app: AppMetadata::default(),
        }
    }
}

/// Returns Result<u64, ConfigError> from parsing a numeric setting
fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl RawConfig {
    /// Returns Result<RawConfig, ConfigError> from a JSON config document.  Missing keys
    /// keep their defaults
    ///
    /// # Arguments
    ///
    /// * `bytes` - JSON document
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).context(ParseConfigSnafu)
    }

    /// Returns Result<RawConfig, ConfigError> after overriding settings with any
    /// `MINT_*` variables.  Unknown variables are ignored
    ///
    /// # Arguments
    ///
    /// * `vars` - (name, value) pairs, typically `std::env::vars()`
    pub fn apply_vars<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let name = match key.strip_prefix(ENV_PREFIX) {
                Some(name) => name,
                None => continue,
            };
            match name {
                "CONTRACT_ADDRESS" => self.contract_address = value,
                "CHAIN_ID" => self.chain_id = parse_number(&key, &value)?,
                "RPC_URL" => self.rpc_url = value,
                "PROJECT_ID" => self.project_id = value,
                "IPFS_GATEWAY" => self.ipfs_gateway = value,
                "FALLBACK_PRICE" => self.fallback_price = value,
                "FALLBACK_IMAGE" => {
                    self.fallback_image = Some(value).filter(|v| !v.trim().is_empty())
                }
                "METADATA_TOKEN_ID" => self.metadata_token_id = parse_number(&key, &value)?,
                "CLAIM_TOKEN_ID" => self.claim_token_id = parse_number(&key, &value)?,
                "REQUEST_TIMEOUT_SECS" => {
                    self.request_timeout_secs = parse_number(&key, &value)?
                }
                _ => {}
            }
        }
        Ok(self)
    }

    /// Returns Result<Config, ConfigError> from validating and converting to the typed
    /// Config
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let contract = parse_address(&self.contract_address).context(InvalidAddressSnafu {
            value: self.contract_address.clone(),
        })?;
        let fallback_value = parse_ether(&self.fallback_price).context(InvalidPriceSnafu {
            value: self.fallback_price.clone(),
        })?;
        ensure!(!self.rpc_url.trim().is_empty(), MissingRpcUrlSnafu);
        ensure!(
            self.request_timeout_secs > 0,
            InvalidNumberSnafu {
                key: "request_timeout_secs",
                value: "0",
            }
        );
        Ok(Config {
            contract,
            chain_id: self.chain_id,
            rpc_url: self.rpc_url,
            project_id: self.project_id,
            ipfs_gateway: self.ipfs_gateway,
            fallback_value,
            fallback_image: self.fallback_image,
            metadata_token_id: U256::from(self.metadata_token_id),
            claim_token_id: self.claim_token_id,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            app: self.app,
        })
    }
}

/// validated settings handed to the loader and invoker at construction
#[derive(Clone, PartialEq, Debug)]
pub struct Config {
    /// collection contract
    pub contract: Address,
    /// chain the contract lives on
    pub chain_id: u64,
    /// JSON-RPC endpoint used for read-only calls
    pub rpc_url: String,
    /// wallet connection project identifier
    pub project_id: String,
    /// HTTP gateway prefix for `ipfs://` URIs
    pub ipfs_gateway: String,
    /// payment in wei attached when the contract price is unknown
    pub fallback_value: U256,
    /// image shown when none can be resolved from metadata
    pub fallback_image: Option<String>,
    /// token whose metadata supplies the display image
    pub metadata_token_id: U256,
    /// token id passed to drop-style `claimTo`
    pub claim_token_id: u64,
    /// limit on every RPC or metadata request
    pub request_timeout: Duration,
    /// dapp description handed to wallet connectors
    pub app: AppMetadata,
}

impl Config {
    /// Returns Result<Config, ConfigError> built from the defaults overridden by the
    /// process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        RawConfig::default()
            .apply_vars(std::env::vars())?
            .into_config()
    }
}
