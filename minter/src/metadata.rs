//! Token metadata resolution: content-addressed URI rewriting, inline `data:` documents,
//! and best-effort image extraction.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

use crate::config::Config;
use crate::error::{HttpSnafu, JsonSnafu, MetadataError, NoImageSnafu};

/// scheme prefix of IPFS content-addressed URIs
pub const IPFS_SCHEME: &str = "ipfs://";

/// placeholder ERC-1155 uses for the hex token id
pub const ID_PLACEHOLDER: &str = "{id}";

/// resolves an HTTP(S) URL to the document stored there
#[async_trait]
pub trait MetadataHost: Send + Sync {
    /// Returns the raw body found at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MetadataError>;
}

/// plain HTTP GET metadata host
pub struct HttpMetadataHost {
    client: reqwest::Client,
}

impl HttpMetadataHost {
    /// Returns Result<HttpMetadataHost, MetadataError> whose requests give up after
    /// `timeout`
    pub fn new(timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context(HttpSnafu)?;
        Ok(HttpMetadataHost { client })
    }

    /// Returns Result<HttpMetadataHost, MetadataError> using the configured timeout
    pub fn from_config(config: &Config) -> Result<Self, MetadataError> {
        HttpMetadataHost::new(config.request_timeout)
    }
}

#[async_trait]
impl MetadataHost for HttpMetadataHost {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MetadataError> {
        let resp = self.client.get(url).send().await.context(HttpSnafu)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().await.context(HttpSnafu)?.to_vec())
    }
}

/// the subset of token metadata used for display
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct TokenMetadata {
    /// name of the item
    pub name: Option<String>,
    /// item description
    pub description: Option<String>,
    /// url to the image
    pub image: Option<String>,
    /// alternate image field used by some platforms
    pub image_url: Option<String>,
}

impl TokenMetadata {
    /// Returns the first non-empty image reference, preferring `image`
    pub fn image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.image_url.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// Returns String of `uri` with an `ipfs://` scheme rewritten onto the HTTP gateway.
/// Other URIs are returned unchanged
///
/// # Arguments
///
/// * `uri` - URI as stored on chain or in metadata
/// * `gateway` - HTTP gateway prefix such as `https://ipfs.io/ipfs/`
pub fn resolve_uri(uri: &str, gateway: &str) -> String {
    let uri = uri.trim();
    match uri.strip_prefix(IPFS_SCHEME) {
        Some(path) => {
            // some minters double up the path segment
            let path = path.strip_prefix("ipfs/").unwrap_or(path);
            format!("{}/{}", gateway.trim_end_matches('/'), path)
        }
        None => uri.to_string(),
    }
}

/// Returns String of `uri` with every `{id}` placeholder replaced by the zero padded,
/// 64 digit lowercase hex token id
pub fn substitute_token_id(uri: &str, token_id: U256) -> String {
    if uri.contains(ID_PLACEHOLDER) {
        let mut word = [0u8; 32];
        token_id.to_big_endian(&mut word);
        uri.replace(ID_PLACEHOLDER, &hex::encode(word))
    } else {
        uri.to_string()
    }
}

/// Returns Option<Result<Vec<u8>, MetadataError>> of the payload of a `data:` URI, or None
/// if `uri` is not a `data:` URI
///
/// # Arguments
///
/// * `uri` - candidate data URI
pub fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, MetadataError>> {
    let rest = uri.trim().strip_prefix("data:")?;
    let (header, payload) = match rest.split_once(',') {
        Some(parts) => parts,
        None => {
            return Some(Err(MetadataError::DataUri {
                reason: "missing ',' separator".to_string(),
            }))
        }
    };
    if header.ends_with(";base64") {
        Some(
            base64::decode(payload.trim()).map_err(|e| MetadataError::DataUri {
                reason: e.to_string(),
            }),
        )
    } else {
        Some(Ok(payload.as_bytes().to_vec()))
    }
}

/// Returns Result<TokenMetadata, MetadataError> from parsing a metadata document
pub fn parse_metadata(body: &[u8]) -> Result<TokenMetadata, MetadataError> {
    serde_json::from_slice(body).context(JsonSnafu)
}

/// resolves token URIs into display images through a metadata host
pub struct MetadataResolver<'a, H: MetadataHost + ?Sized> {
    /// where HTTP documents are fetched from
    pub host: &'a H,
    /// HTTP gateway prefix for content-addressed URIs
    pub gateway: &'a str,
}

impl<'a, H: MetadataHost + ?Sized> MetadataResolver<'a, H> {
    /// Returns Result<TokenMetadata, MetadataError> of the document a token URI points to
    ///
    /// # Arguments
    ///
    /// * `token_uri` - URI returned by the contract
    pub async fn fetch_metadata(&self, token_uri: &str) -> Result<TokenMetadata, MetadataError> {
        let body = match decode_data_uri(token_uri) {
            Some(inline) => inline?,
            None => {
                let url = resolve_uri(token_uri, self.gateway);
                debug!("fetching token metadata from {}", url);
                self.host.fetch(&url).await?
            }
        };
        parse_metadata(&body)
    }

    /// Returns Result<String, MetadataError> of the gateway-resolved image URL for a token URI
    ///
    /// # Arguments
    ///
    /// * `token_uri` - URI returned by the contract
    pub async fn resolve_image(&self, token_uri: &str) -> Result<String, MetadataError> {
        let metadata = self.fetch_metadata(token_uri).await?;
        let image = metadata.image().context(NoImageSnafu)?;
        Ok(resolve_uri(image, self.gateway))
    }
}
