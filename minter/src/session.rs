//! The mint page session: connection state, the latest contract snapshot, and the user
//! facing status line.  Every failure below this layer ends up as a Status.

use std::fmt;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::abi::{format_address, Address};
use crate::calls::{default_candidates, MintCandidate};
use crate::config::Config;
use crate::error::WalletError;
use crate::invoker::{parse_quantity, MintInvoker, MintOutcome, MintPhase, MintReport, MintRequest};
use crate::loader::{ContractSnapshot, InfoLoader};
use crate::metadata::MetadataHost;
use crate::rpc::ChainReader;
use crate::wallet::{WalletConnector, WalletSigner};

/// user facing status line
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ready,
    WalletConnected,
    ConnectFailed,
    NoWallet,
    WrongNetwork,
    ConnectFirst,
    Minting,
    MintSuccessful,
    TransactionRejected,
    MintFailed,
}

impl Status {
    /// Returns the message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Status::Ready => "Ready",
            Status::WalletConnected => "Wallet connected",
            Status::ConnectFailed => "Failed to connect",
            Status::NoWallet => "No wallet found",
            Status::WrongNetwork => "Wrong network",
            Status::ConnectFirst => "Connect wallet first",
            Status::Minting => "Minting...",
            Status::MintSuccessful => "Mint successful",
            Status::TransactionRejected => "Transaction rejected",
            Status::MintFailed => "Mint failed. Contract uses a custom mint function.",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// connection and progress state of the page
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct SessionState {
    /// true once a wallet has authorized the page
    pub connected: bool,
    /// connected address
    pub address: Option<Address>,
    /// current status line
    pub status: Status,
    /// true while a mint is in flight
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            connected: false,
            address: None,
            status: Status::Ready,
            loading: false,
        }
    }
}

/// one open mint page: loads contract info, connects a wallet and mints
pub struct MintPage<R: ChainReader, H: MetadataHost> {
    config: Config,
    loader: InfoLoader<R, H>,
    invoker: MintInvoker,
    session: SessionState,
    snapshot: ContractSnapshot,
    signer: Option<Box<dyn WalletSigner>>,
    quantity: u32,
}

impl<R: ChainReader, H: MetadataHost> MintPage<R, H> {
    /// Returns a MintPage probing the default candidate list
    ///
    /// # Arguments
    ///
    /// * `config` - validated settings
    /// * `reader` - read-only chain connection
    /// * `host` - metadata host
    pub fn new(config: Config, reader: R, host: H) -> Self {
        let loader = InfoLoader::new(&config, reader, host);
        let invoker = MintInvoker::new(config.contract, default_candidates(config.claim_token_id));
        MintPage {
            config,
            loader,
            invoker,
            session: SessionState::default(),
            snapshot: ContractSnapshot::default(),
            signer: None,
            quantity: 1,
        }
    }

    /// Returns the page with a custom candidate list
    pub fn with_candidates(mut self, candidates: Vec<MintCandidate>) -> Self {
        self.invoker = MintInvoker::new(self.config.contract, candidates);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn snapshot(&self) -> &ContractSnapshot {
        &self.snapshot
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the invoker's phase, Idle between invocations
    pub fn phase(&self) -> MintPhase {
        self.invoker.phase()
    }

    /// reloads the contract snapshot
    pub async fn refresh(&mut self) {
        self.snapshot = self.loader.load().await;
    }

    /// drops any stored signer
    fn disconnect(&mut self) {
        self.signer = None;
        self.session.connected = false;
        self.session.address = None;
    }

    /// asks the connector for a wallet and stores the signer it returns.  A failed
    /// attempt, or a wallet on another chain, leaves the page disconnected
    ///
    /// # Arguments
    ///
    /// * `connector` - wallet connector
    pub async fn connect<C: WalletConnector + ?Sized>(&mut self, connector: &C) {
        let result = connector
            .connect(&self.config.app, &self.config.project_id)
            .await;
        self.disconnect();
        match result {
            Ok(signer) => {
                let address = signer.address();
                let chain_id = signer.chain_id();
                if chain_id != self.config.chain_id {
                    warn!(
                        "wallet {} is on chain {}, expected {}",
                        format_address(&address),
                        chain_id,
                        self.config.chain_id
                    );
                    self.session.status = Status::WrongNetwork;
                    return;
                }
                info!("wallet {} connected", format_address(&address));
                self.session.connected = true;
                self.session.address = Some(address);
                self.session.status = Status::WalletConnected;
                self.signer = Some(signer);
            }
            Err(WalletError::NoWallet) => {
                warn!("no wallet available");
                self.session.status = Status::NoWallet;
            }
            Err(e) => {
                warn!("wallet connection failed: {}", e);
                self.session.status = Status::ConnectFailed;
            }
        }
    }

    /// sets the quantity from user input, defaulting to 1
    pub fn set_quantity(&mut self, input: &str) {
        self.quantity = parse_quantity(input);
    }

    /// Returns true if the mint action is available
    pub fn can_mint(&self) -> bool {
        self.session.connected && !self.session.loading
    }

    /// Returns Option<MintReport> of the invocation, or None if minting could not start
    pub async fn mint(&mut self) -> Option<MintReport> {
        if self.session.loading {
            return None;
        }
        let signer = match self.signer.as_deref() {
            Some(signer) => signer,
            None => {
                self.session.status = Status::ConnectFirst;
                return None;
            }
        };
        self.session.loading = true;
        self.session.status = Status::Minting;
        self.invoker.prepare();

        let request = match MintRequest::new(
            signer.address(),
            self.quantity,
            self.snapshot.price_per_unit,
            self.config.fallback_value,
        ) {
            Ok(request) => request,
            Err(e) => {
                error!("cannot price mint of {}: {}", self.quantity, e);
                self.session.status = Status::MintFailed;
                self.session.loading = false;
                self.invoker.reset();
                return None;
            }
        };
        let report = self.invoker.invoke(signer, &request).await;
        self.session.status = match report.outcome {
            MintOutcome::Confirmed { .. } => Status::MintSuccessful,
            MintOutcome::Rejected { .. } => Status::TransactionRejected,
            MintOutcome::Exhausted => Status::MintFailed,
        };
        if report.is_success() {
            self.refresh().await;
        }
        self.invoker.reset();
        self.session.loading = false;
        Some(report)
    }
}
