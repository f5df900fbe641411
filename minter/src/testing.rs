//! In-memory collaborators for unit tests: a contract that answers calls by selector and
//! mints on submitted transactions, a scripted signer and connector, and a metadata host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use primitive_types::{H256, U256};

use crate::abi::{selector, uint_at, Address, Token, WORD};
use crate::calls::{MintFunction, ReadCall};
use crate::config::{AppMetadata, DEFAULT_CHAIN_ID};
use crate::error::{ChainError, MetadataError, WalletError};
use crate::loader::NATIVE_TOKEN;
use crate::metadata::MetadataHost;
use crate::rpc::ChainReader;
use crate::wallet::{Receipt, TransactionRequest, WalletConnector, WalletSigner};

/// Returns Vec<u8> of a single ABI encoded string return value
pub fn encode_string(value: &str) -> Vec<u8> {
    let mut out = Token::Uint(U256::from(WORD)).to_word().to_vec();
    out.extend_from_slice(&Token::Uint(U256::from(value.len())).to_word());
    out.extend_from_slice(value.as_bytes());
    let pad = (WORD - value.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(pad));
    out
}

/// Returns Vec<u8> of a `getClaimConditionById` return value with an empty merkle root
/// and empty metadata string
pub fn encode_claim_condition(
    start: u64,
    supply_claimed: u64,
    max_claimable: u64,
    limit: u64,
    price: U256,
    currency: Address,
) -> Vec<u8> {
    let words = [
        Token::Uint(U256::from(WORD)),
        Token::Uint(U256::from(start)),
        Token::Uint(U256::from(max_claimable)),
        Token::Uint(U256::from(supply_claimed)),
        Token::Uint(U256::from(limit)),
        Token::Uint(U256::zero()),
        Token::Uint(price),
        Token::Address(currency),
        // metadata offset relative to the tuple, then its zero length
        Token::Uint(U256::from(8 * WORD)),
        Token::Uint(U256::zero()),
    ];
    words.iter().flat_map(|t| t.to_word().to_vec()).collect()
}

/// mutable state of a MockContract
#[derive(Default)]
struct ContractState {
    /// fixed return data by selector
    reads: HashMap<[u8; 4], Vec<u8>>,
    total_supply: Option<U256>,
    /// (supply claimed, max claimable, price, currency)
    claim: Option<(u64, u64, U256, Address)>,
    /// price the mint functions enforce
    unit_price: U256,
    mint_functions: Vec<MintFunction>,
    minted: u64,
}

/// an NFT contract that only implements the functions it is given
#[derive(Clone, Default)]
pub struct MockContract {
    state: Arc<Mutex<ContractState>>,
}

impl MockContract {
    /// contract implementing nothing
    pub fn empty() -> Self {
        MockContract::default()
    }

    /// contract implementing `name()` and `symbol()`
    pub fn erc721(name: &str, symbol: &str) -> Self {
        MockContract::empty()
            .with_read(ReadCall::Name.signature(), encode_string(name))
            .with_read(ReadCall::Symbol.signature(), encode_string(symbol))
    }

    pub fn address(&self) -> Address {
        Address::repeat_byte(0xc0)
    }

    fn with_read(self, signature: &str, data: Vec<u8>) -> Self {
        self.state
            .lock()
            .unwrap()
            .reads
            .insert(selector(signature), data);
        self
    }

    pub fn with_total_supply(self, supply: u64) -> Self {
        self.state.lock().unwrap().total_supply = Some(U256::from(supply));
        self
    }

    pub fn with_max_supply(self, cap: u64) -> Self {
        self.with_read("maxSupply()", Token::Uint(U256::from(cap)).to_word().to_vec())
    }

    /// implements the price accessor `signature` and charges `price` per unit on mint
    pub fn with_price(self, signature: &str, price: U256) -> Self {
        self.state.lock().unwrap().unit_price = price;
        self.with_read(signature, Token::Uint(price).to_word().to_vec())
    }

    /// implements `tokenURI(uint256)` or `uri(uint256)` returning `uri` for every id
    pub fn with_token_uri(self, signature: &str, uri: &str) -> Self {
        self.with_read(signature, encode_string(uri))
    }

    /// implements the drop claim condition accessors with condition id 0, priced in the
    /// native token
    pub fn with_claim_condition(self, supply_claimed: u64, max_claimable: u64, price: U256) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.claim = Some((supply_claimed, max_claimable, price, NATIVE_TOKEN));
            state.unit_price = price;
        }
        self
    }

    /// prices the claim condition in the token at `currency`
    pub fn with_claim_currency(self, currency: Address) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(claim) = state.claim.as_mut() {
                claim.3 = currency;
            }
            state.unit_price = U256::zero();
        }
        self
    }

    /// implements the given mint entry point
    pub fn with_mint_function(self, function: MintFunction) -> Self {
        self.state.lock().unwrap().mint_functions.push(function);
        self
    }

    /// Returns the number of units minted through transactions
    pub fn minted(&self) -> u64 {
        self.state.lock().unwrap().minted
    }

    /// Returns Result<(), WalletError> after executing a mint transaction the way a
    /// wallet's gas estimation would see it
    fn apply_mint(&self, tx: &TransactionRequest) -> Result<(), WalletError> {
        let mut state = self.state.lock().unwrap();
        let function = state
            .mint_functions
            .iter()
            .copied()
            .find(|f| tx.data.len() >= 4 && tx.data[..4] == selector(f.signature()))
            .ok_or_else(|| WalletError::Estimation {
                message: "cannot estimate gas; execution reverted".to_string(),
            })?;
        let quantity = uint_at(&tx.data[4..], function.arity() - 1).map_err(|e| {
            WalletError::Estimation {
                message: e.to_string(),
            }
        })?;
        if tx.value < state.unit_price * quantity {
            return Err(WalletError::TxReverted {
                message: "execution reverted: insufficient payment".to_string(),
            });
        }
        let qty = quantity.as_u64();
        state.minted += qty;
        if let Some(supply) = state.total_supply.as_mut() {
            *supply += quantity;
        }
        if let Some(claim) = state.claim.as_mut() {
            claim.0 += qty;
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MockContract {
    async fn call(&self, _contract: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let state = self.state.lock().unwrap();
        let sel: [u8; 4] = match data.get(..4) {
            Some(s) => [s[0], s[1], s[2], s[3]],
            None => return Err(ChainError::EmptyReturn),
        };
        let missing = || ChainError::Reverted {
            message: "execution reverted".to_string(),
        };
        if let Some(found) = state.reads.get(&sel) {
            return Ok(found.clone());
        }
        if sel == selector(ReadCall::TotalSupply.signature()) {
            return state
                .total_supply
                .map(|s| Token::Uint(s).to_word().to_vec())
                .ok_or_else(missing);
        }
        if let Some((claimed, max, price, currency)) = state.claim {
            if sel == selector(ReadCall::ActiveClaimConditionId.signature()) {
                return Ok(Token::Uint(U256::zero()).to_word().to_vec());
            }
            if sel == selector(ReadCall::ClaimConditionById(U256::zero()).signature()) {
                return Ok(encode_claim_condition(0, claimed, max, 0, price, currency));
            }
        }
        Err(missing())
    }
}

/// shared record of what a MockSigner was asked to do
#[derive(Default)]
struct SignerLog {
    submissions: Vec<TransactionRequest>,
    reverted: Vec<H256>,
}

/// a signer that executes transactions against a MockContract
#[derive(Clone)]
pub struct MockSigner {
    address: Address,
    chain_id: u64,
    contract: MockContract,
    rejecting: Vec<MintFunction>,
    reverting: Vec<MintFunction>,
    log: Arc<Mutex<SignerLog>>,
}

impl MockSigner {
    pub fn new(address: Address, contract: MockContract) -> Self {
        MockSigner {
            address,
            chain_id: DEFAULT_CHAIN_ID,
            contract,
            rejecting: Vec::new(),
            reverting: Vec::new(),
            log: Arc::new(Mutex::new(SignerLog::default())),
        }
    }

    /// the wallet is connected to `chain_id` instead of Base
    pub fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// the user declines to sign calls to `function`
    pub fn rejecting(mut self, function: MintFunction) -> Self {
        self.rejecting.push(function);
        self
    }

    /// calls to `function` are mined but revert
    pub fn reverting_on_chain(mut self, function: MintFunction) -> Self {
        self.reverting.push(function);
        self
    }

    /// Returns every transaction handed to `send_transaction`
    pub fn submissions(&self) -> Vec<TransactionRequest> {
        self.log.lock().unwrap().submissions.clone()
    }
}

fn calls(functions: &[MintFunction], data: &[u8]) -> bool {
    functions
        .iter()
        .any(|f| data.len() >= 4 && data[..4] == selector(f.signature()))
}

#[async_trait]
impl WalletSigner for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<H256, WalletError> {
        let hash = {
            let mut log = self.log.lock().unwrap();
            log.submissions.push(tx.clone());
            H256::from_low_u64_be(log.submissions.len() as u64)
        };
        if calls(&self.rejecting, &tx.data) {
            return Err(WalletError::from_provider(4001, "User rejected the request."));
        }
        if calls(&self.reverting, &tx.data) {
            self.log.lock().unwrap().reverted.push(hash);
            return Ok(hash);
        }
        self.contract.apply_mint(&tx)?;
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: H256) -> Result<Receipt, WalletError> {
        let success = !self.log.lock().unwrap().reverted.contains(&hash);
        Ok(Receipt {
            transaction_hash: hash,
            block_number: Some(hash.to_low_u64_be()),
            success,
        })
    }
}

/// a connector that either hands out a MockSigner or fails
pub struct MockConnector {
    result: Result<MockSigner, WalletError>,
    /// (app name, project id) of every prompt
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockConnector {
    pub fn with_signer(signer: MockSigner) -> Self {
        MockConnector {
            result: Ok(signer),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: WalletError) -> Self {
        MockConnector {
            result: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns the app name and project id each connection attempt was made with
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    async fn connect(
        &self,
        app: &AppMetadata,
        project_id: &str,
    ) -> Result<Box<dyn WalletSigner>, WalletError> {
        self.prompts
            .lock()
            .unwrap()
            .push((app.name.clone(), project_id.to_string()));
        match &self.result {
            Ok(signer) => Ok(Box::new(signer.clone())),
            Err(e) => Err(e.clone()),
        }
    }
}

/// serves fixed documents by URL and records every request
#[derive(Clone, Default)]
pub struct MockHost {
    documents: HashMap<String, Vec<u8>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockHost {
    pub fn with_document(mut self, url: &str, body: &str) -> Self {
        self.documents
            .insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataHost for MockHost {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MetadataError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound {
                url: url.to_string(),
            })
    }
}
