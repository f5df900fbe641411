//! The wallet boundary: a connector hands out a signer, the signer submits and confirms
//! transactions on the buyer's behalf.

use async_trait::async_trait;
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};

use crate::abi::Address;
use crate::config::AppMetadata;
use crate::error::WalletError;

/// EIP-1193 error code for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;

/// a payable contract call submitted through the signer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    /// sending address
    pub from: Address,
    /// contract being called
    pub to: Address,
    /// value attached in wei
    pub value: U256,
    /// calldata
    pub data: Vec<u8>,
}

/// outcome of a mined transaction
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// hash of the transaction
    pub transaction_hash: H256,
    /// block the transaction was included in, if the signer reports it
    pub block_number: Option<u64>,
    /// false if the transaction reverted on chain
    pub success: bool,
}

/// an authorized handle able to submit transactions for one address
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Returns the address this signer acts for
    fn address(&self) -> Address;

    /// Returns the chain the wallet is currently connected to
    fn chain_id(&self) -> u64;

    /// Returns the hash of the submitted transaction
    ///
    /// # Arguments
    ///
    /// * `tx` - transaction to sign and submit
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<H256, WalletError>;

    /// Returns the receipt once the transaction is confirmed
    ///
    /// # Arguments
    ///
    /// * `hash` - hash returned by `send_transaction`
    async fn wait_for_confirmation(&self, hash: H256) -> Result<Receipt, WalletError>;
}

/// obtains user authorization and a signer
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Returns a signer once the user has authorized the page
    ///
    /// # Arguments
    ///
    /// * `app` - dapp description shown in the wallet prompt
    /// * `project_id` - wallet connection project identifier
    async fn connect(
        &self,
        app: &AppMetadata,
        project_id: &str,
    ) -> Result<Box<dyn WalletSigner>, WalletError>;
}

impl WalletError {
    /// Returns WalletError classified from a provider's error code and message
    ///
    /// # Arguments
    ///
    /// * `code` - numeric provider error code
    /// * `message` - provider error message
    pub fn from_provider(code: i64, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if code == USER_REJECTED_CODE
            || lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("action_rejected")
        {
            WalletError::Rejected
        } else if lower.contains("revert") {
            WalletError::TxReverted {
                message: message.to_string(),
            }
        } else if lower.contains("gas") && lower.contains("estimat") {
            WalletError::Estimation {
                message: message.to_string(),
            }
        } else {
            WalletError::Provider {
                code,
                message: message.to_string(),
            }
        }
    }

    /// Returns true if the user explicitly declined the signing prompt
    pub fn is_rejection(&self) -> bool {
        matches!(self, WalletError::Rejected)
    }
}
