//! Read-only info loader.  Every accessor is queried on its own; one that fails leaves its
//! field unknown and never stops the rest.

use log::debug;
use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};

use crate::abi::{
    address_at, decode_string, decode_uint, format_address, tuple_offset, uint_at, Address, WORD,
};
use crate::calls::{ReadCall, PRICE_ACCESSORS};
use crate::config::Config;
use crate::error::ChainError;
use crate::metadata::{substitute_token_id, MetadataHost, MetadataResolver};
use crate::rpc::ChainReader;
use crate::units::format_ether;

/// shown in place of an unknown value
pub const UNKNOWN: &str = "-";

/// currency address drop contracts use for the chain's native token
pub const NATIVE_TOKEN: Address = H160([0xee; 20]);

/// the active claim condition of a drop-style contract
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ClaimCondition {
    /// unix time the condition starts
    pub start_timestamp: U256,
    /// supply cap under this condition
    pub max_claimable_supply: U256,
    /// units claimed so far
    pub supply_claimed: U256,
    /// per-wallet limit
    pub quantity_limit_per_wallet: U256,
    /// price of one unit
    pub price_per_token: U256,
    /// payment currency
    pub currency: Address,
}

impl ClaimCondition {
    /// Returns Result<ClaimCondition, ChainError> from decoding the tuple returned by
    /// `getClaimConditionById`
    ///
    /// # Arguments
    ///
    /// * `data` - raw return data
    pub fn decode(data: &[u8]) -> Result<Self, ChainError> {
        let base = tuple_offset(data)?;
        let fields = data.get(base..).ok_or_else(|| ChainError::Decode {
            reason: "claim condition offset past end".to_string(),
        })?;
        // head: start, maxClaimable, claimed, limit, merkleRoot, price, currency, metadata
        if fields.len() < 8 * WORD {
            return Err(ChainError::Decode {
                reason: format!("claim condition head needs {} bytes", 8 * WORD),
            });
        }
        Ok(ClaimCondition {
            start_timestamp: uint_at(fields, 0)?,
            max_claimable_supply: uint_at(fields, 1)?,
            supply_claimed: uint_at(fields, 2)?,
            quantity_limit_per_wallet: uint_at(fields, 3)?,
            price_per_token: uint_at(fields, 5)?,
            currency: address_at(fields, 6)?,
        })
    }

    /// Returns Option<U256> of the unit price if it is paid in the native token, the
    /// only currency that can be attached as call value
    pub fn native_price(&self) -> Option<U256> {
        if self.currency == NATIVE_TOKEN {
            Some(self.price_per_token)
        } else {
            None
        }
    }
}

/// public contract state as of the last refresh
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct ContractSnapshot {
    /// collection name
    pub name: Option<String>,
    /// collection symbol
    pub symbol: Option<String>,
    /// units minted so far
    pub total_supply: Option<U256>,
    /// supply cap
    pub max_supply: Option<U256>,
    /// price of one unit in wei
    pub price_per_unit: Option<U256>,
    /// active claim condition on drop-style contracts
    pub claim_condition: Option<ClaimCondition>,
    /// metadata URI of the display token
    pub token_uri: Option<String>,
    /// HTTP url of the display image
    pub image_url: Option<String>,
}

impl ContractSnapshot {
    /// Returns the minted count, falling back to the claim condition's claimed supply
    pub fn minted(&self) -> Option<U256> {
        self.total_supply.or_else(|| {
            self.claim_condition
                .as_ref()
                .map(|c| c.supply_claimed)
        })
    }

    /// Returns the supply cap, falling back to the claim condition's cap
    pub fn cap(&self) -> Option<U256> {
        self.max_supply.or_else(|| {
            self.claim_condition
                .as_ref()
                .map(|c| c.max_claimable_supply)
        })
    }

    /// Returns String "minted / cap" for display
    pub fn supply_display(&self) -> String {
        let show = |v: Option<U256>| v.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string());
        format!("{} / {}", show(self.minted()), show(self.cap()))
    }

    /// Returns String of the unit price in ether for display
    pub fn price_display(&self) -> String {
        self.price_per_unit
            .map_or_else(|| UNKNOWN.to_string(), |p| format!("{} ETH", format_ether(p)))
    }
}

/// queries a contract through a read-only connection
pub struct InfoLoader<R: ChainReader, H: MetadataHost> {
    contract: Address,
    token_id: U256,
    gateway: String,
    fallback_image: Option<String>,
    reader: R,
    host: H,
}

impl<R: ChainReader, H: MetadataHost> InfoLoader<R, H> {
    /// Returns a loader for the contract named in `config`
    ///
    /// # Arguments
    ///
    /// * `config` - validated settings
    /// * `reader` - read-only chain connection
    /// * `host` - metadata host
    pub fn new(config: &Config, reader: R, host: H) -> Self {
        InfoLoader {
            contract: config.contract,
            token_id: config.metadata_token_id,
            gateway: config.ipfs_gateway.clone(),
            fallback_image: config.fallback_image.clone(),
            reader,
            host,
        }
    }

    /// Returns Option<Vec<u8>> of the raw result of one accessor, or None if it failed
    async fn query(&self, call: ReadCall) -> Option<Vec<u8>> {
        match self.reader.call(self.contract, call.calldata()).await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(
                    "{} on {} unavailable: {}",
                    call.signature(),
                    format_address(&self.contract),
                    e
                );
                None
            }
        }
    }

    /// Returns Option<T> of one accessor decoded with `decode`, or None on any failure
    async fn read<T>(
        &self,
        call: ReadCall,
        decode: fn(&[u8]) -> Result<T, ChainError>,
    ) -> Option<T> {
        let data = self.query(call).await?;
        match decode(&data) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("{} returned unusable data: {}", call.signature(), e);
                None
            }
        }
    }

    /// Returns Option<ClaimCondition> of the active claim condition
    async fn read_claim_condition(&self) -> Option<ClaimCondition> {
        let id = self
            .read(ReadCall::ActiveClaimConditionId, decode_uint)
            .await?;
        self.read(ReadCall::ClaimConditionById(id), ClaimCondition::decode)
            .await
    }

    /// Returns Option<String> of the display token's metadata URI
    async fn read_token_uri(&self) -> Option<String> {
        let uri = match self.read(ReadCall::TokenUri(self.token_id), decode_string).await {
            Some(uri) => uri,
            None => self.read(ReadCall::Uri(self.token_id), decode_string).await?,
        };
        Some(substitute_token_id(&uri, self.token_id)).filter(|u| !u.trim().is_empty())
    }

    /// Returns ContractSnapshot of everything that could be read right now
    pub async fn load(&self) -> ContractSnapshot {
        let name = self.read(ReadCall::Name, decode_string).await;
        let symbol = self.read(ReadCall::Symbol, decode_string).await;
        let total_supply = self.read(ReadCall::TotalSupply, decode_uint).await;
        let max_supply = self.read(ReadCall::MaxSupply, decode_uint).await;
        let claim_condition = self.read_claim_condition().await;

        let mut price_per_unit = None;
        for call in PRICE_ACCESSORS.iter() {
            if let Some(price) = self.read(*call, decode_uint).await {
                price_per_unit = Some(price);
                break;
            }
        }
        if price_per_unit.is_none() {
            price_per_unit = claim_condition.as_ref().and_then(ClaimCondition::native_price);
        }

        let token_uri = self.read_token_uri().await;
        let mut image_url = None;
        if let Some(uri) = token_uri.as_deref() {
            let resolver = MetadataResolver {
                host: &self.host,
                gateway: &self.gateway,
            };
            match resolver.resolve_image(uri).await {
                Ok(url) => image_url = Some(url),
                Err(e) => debug!("no image from {}: {}", uri, e),
            }
        }
        if image_url.is_none() {
            image_url = self.fallback_image.clone();
        }

        ContractSnapshot {
            name,
            symbol,
            total_supply,
            max_supply,
            price_per_unit,
            claim_condition,
            token_uri,
            image_url,
        }
    }
}
