//! Client side minting for an NFT collection: a read-only info loader, a mint invoker
//! that probes candidate mint entry points in order, and the page session tying them to a
//! connected wallet.

pub mod abi;
pub mod calls;
pub mod config;
pub mod error;
pub mod invoker;
pub mod loader;
pub mod metadata;
pub mod rpc;
pub mod session;
pub mod units;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use config::{Config, RawConfig};
pub use invoker::{MintInvoker, MintOutcome, MintReport, MintRequest};
pub use loader::{ContractSnapshot, InfoLoader};
pub use metadata::HttpMetadataHost;
pub use rpc::JsonRpcReader;
pub use session::{MintPage, SessionState, Status};
pub use wallet::{WalletConnector, WalletSigner};
