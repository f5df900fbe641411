//! Fixed call descriptors: the candidate mint entry points and the read-only accessors.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::abi::{encode_call, selector, Address, Token};

/// a plausible mint entry point with a fixed argument shape
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MintFunction {
    /// `mintTo(address to, uint256 quantity)`
    MintTo,
    /// `claim(uint256 quantity)`
    Claim,
    /// `mint(uint256 quantity)`
    Mint,
    /// `safeMint(address to, uint256 quantity)`
    SafeMint,
    /// drop-style `claimTo(address to, uint256 tokenId, uint256 quantity)`
    ClaimTo {
        /// token id claimed on edition drops
        token_id: u64,
    },
}

impl MintFunction {
    /// Returns the function name
    pub fn name(&self) -> &'static str {
        match self {
            MintFunction::MintTo => "mintTo",
            MintFunction::Claim => "claim",
            MintFunction::Mint => "mint",
            MintFunction::SafeMint => "safeMint",
            MintFunction::ClaimTo { .. } => "claimTo",
        }
    }

    /// Returns the canonical signature used to derive the selector
    pub fn signature(&self) -> &'static str {
        match self {
            MintFunction::MintTo => "mintTo(address,uint256)",
            MintFunction::Claim => "claim(uint256)",
            MintFunction::Mint => "mint(uint256)",
            MintFunction::SafeMint => "safeMint(address,uint256)",
            MintFunction::ClaimTo { .. } => "claimTo(address,uint256,uint256)",
        }
    }

    /// Returns the number of arguments the function takes
    pub fn arity(&self) -> usize {
        match self {
            MintFunction::Claim | MintFunction::Mint => 1,
            MintFunction::MintTo | MintFunction::SafeMint => 2,
            MintFunction::ClaimTo { .. } => 3,
        }
    }

    /// Returns Vec<Token> of the arguments for minting `quantity` units to `to`
    ///
    /// # Arguments
    ///
    /// * `to` - receiving address
    /// * `quantity` - number of units
    pub fn arguments(&self, to: Address, quantity: u32) -> Vec<Token> {
        let qty = Token::Uint(U256::from(quantity));
        match self {
            MintFunction::Claim | MintFunction::Mint => vec![qty],
            MintFunction::MintTo | MintFunction::SafeMint => vec![Token::Address(to), qty],
            MintFunction::ClaimTo { token_id } => vec![
                Token::Address(to),
                Token::Uint(U256::from(*token_id)),
                qty,
            ],
        }
    }
}

/// one entry of the ordered candidate list
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintCandidate {
    /// entry point to call
    pub function: MintFunction,
    /// true if the payment is attached as call value
    pub payable: bool,
}

impl MintCandidate {
    /// Returns a candidate that carries the payment
    pub fn payable(function: MintFunction) -> Self {
        MintCandidate {
            function,
            payable: true,
        }
    }

    /// Returns a candidate that is called without value
    pub fn free(function: MintFunction) -> Self {
        MintCandidate {
            function,
            payable: false,
        }
    }

    /// Returns Vec<u8> calldata for minting `quantity` units to `to`
    pub fn calldata(&self, to: Address, quantity: u32) -> Vec<u8> {
        encode_call(
            self.function.signature(),
            &self.function.arguments(to, quantity),
        )
    }

    /// Returns U256 of the value to attach given the computed total payment
    pub fn value(&self, total: U256) -> U256 {
        if self.payable {
            total
        } else {
            U256::zero()
        }
    }
}

/// Returns Vec<MintCandidate> in the order they are probed
///
/// # Arguments
///
/// * `drop_token_id` - token id used by the drop-style `claimTo` candidate
pub fn default_candidates(drop_token_id: u64) -> Vec<MintCandidate> {
    vec![
        MintCandidate::payable(MintFunction::MintTo),
        MintCandidate::payable(MintFunction::Claim),
        MintCandidate::payable(MintFunction::Mint),
        MintCandidate::payable(MintFunction::SafeMint),
        MintCandidate::payable(MintFunction::ClaimTo {
            token_id: drop_token_id,
        }),
    ]
}

/// read-only accessors the loader knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadCall {
    Name,
    Symbol,
    TotalSupply,
    MaxSupply,
    Price,
    Cost,
    PublicSalePrice,
    ActiveClaimConditionId,
    ClaimConditionById(U256),
    TokenUri(U256),
    Uri(U256),
}

/// price accessors in priority order
pub const PRICE_ACCESSORS: [ReadCall; 3] =
    [ReadCall::Price, ReadCall::Cost, ReadCall::PublicSalePrice];

impl ReadCall {
    /// Returns the canonical signature of the accessor
    pub fn signature(&self) -> &'static str {
        match self {
            ReadCall::Name => "name()",
            ReadCall::Symbol => "symbol()",
            ReadCall::TotalSupply => "totalSupply()",
            ReadCall::MaxSupply => "maxSupply()",
            ReadCall::Price => "price()",
            ReadCall::Cost => "cost()",
            ReadCall::PublicSalePrice => "publicSalePrice()",
            ReadCall::ActiveClaimConditionId => "getActiveClaimConditionId()",
            ReadCall::ClaimConditionById(_) => "getClaimConditionById(uint256)",
            ReadCall::TokenUri(_) => "tokenURI(uint256)",
            ReadCall::Uri(_) => "uri(uint256)",
        }
    }

    /// Returns Vec<u8> of the calldata for this accessor
    pub fn calldata(&self) -> Vec<u8> {
        match self {
            ReadCall::ClaimConditionById(id) | ReadCall::TokenUri(id) | ReadCall::Uri(id) => {
                encode_call(self.signature(), &[Token::Uint(*id)])
            }
            _ => selector(self.signature()).to_vec(),
        }
    }
}
