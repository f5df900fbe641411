//! Just enough of the contract ABI to call fixed, known signatures: selectors, static
//! argument words, and the handful of return shapes the loader reads.

use primitive_types::{H160, U256};
use sha3::{Digest, Keccak256};
use snafu::{ensure, ResultExt};

use crate::error::{AddressError, AddressHexSnafu, AddressLengthSnafu, ChainError};

/// 20-byte account or contract address
pub type Address = H160;

/// size of one ABI word
pub const WORD: usize = 32;

/// a static call argument
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(U256),
}

impl Token {
    /// Returns the 32 byte ABI word for this argument
    pub fn to_word(&self) -> [u8; WORD] {
        let mut word = [0u8; WORD];
        match self {
            Token::Address(a) => word[WORD - 20..].copy_from_slice(a.as_bytes()),
            Token::Uint(u) => u.to_big_endian(&mut word),
        }
        word
    }
}

/// Returns [u8; 4] function selector of a canonical signature like `mint(uint256)`
///
/// # Arguments
///
/// * `signature` - canonical function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash[..4]);
    sel
}

/// Returns Vec<u8> of calldata for a function taking only static arguments
///
/// # Arguments
///
/// * `signature` - canonical function signature
/// * `args` - arguments in declaration order
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    data
}

/// Returns Result<&[u8], ChainError> of the word at byte offset `pos`
fn word_at(data: &[u8], pos: usize) -> Result<&[u8], ChainError> {
    data.get(pos..pos + WORD).ok_or_else(|| ChainError::Decode {
        reason: format!("need {} bytes, got {}", pos + WORD, data.len()),
    })
}

/// Returns Result<U256, ChainError> of the `index`th word of `data` read as a uint256
///
/// # Arguments
///
/// * `data` - raw return data
/// * `index` - word index
pub fn uint_at(data: &[u8], index: usize) -> Result<U256, ChainError> {
    Ok(U256::from_big_endian(word_at(data, index * WORD)?))
}

/// Returns Result<Address, ChainError> of the `index`th word of `data` read as an address
pub fn address_at(data: &[u8], index: usize) -> Result<Address, ChainError> {
    let word = word_at(data, index * WORD)?;
    Ok(Address::from_slice(&word[WORD - 20..]))
}

/// Returns Result<usize, ChainError> of an offset or length word that must fit in the data
fn usize_at(data: &[u8], pos: usize) -> Result<usize, ChainError> {
    let value = U256::from_big_endian(word_at(data, pos)?);
    if value > U256::from(data.len()) {
        return Err(ChainError::Decode {
            reason: format!("offset {} exceeds return data", value),
        });
    }
    Ok(value.as_usize())
}

/// Returns Result<(), ChainError> rejecting the empty return data a missing function
/// produces
fn check_present(data: &[u8]) -> Result<(), ChainError> {
    ensure!(!data.is_empty(), crate::error::EmptyReturnSnafu);
    Ok(())
}

/// Returns Result<U256, ChainError> from decoding a single uint256 return value
pub fn decode_uint(data: &[u8]) -> Result<U256, ChainError> {
    check_present(data)?;
    uint_at(data, 0)
}

/// Returns Result<String, ChainError> from decoding a single string return value
pub fn decode_string(data: &[u8]) -> Result<String, ChainError> {
    check_present(data)?;
    let offset = usize_at(data, 0)?;
    decode_string_at(data, offset)
}

/// Returns Result<String, ChainError> from decoding a string whose length word starts at
/// byte offset `offset`
///
/// # Arguments
///
/// * `data` - raw return data
/// * `offset` - byte offset of the length word
pub fn decode_string_at(data: &[u8], offset: usize) -> Result<String, ChainError> {
    let len = usize_at(data, offset)?;
    let start = offset + WORD;
    let bytes = data.get(start..start + len).ok_or_else(|| ChainError::Decode {
        reason: format!("string of {} bytes runs past the return data", len),
    })?;
    String::from_utf8(bytes.to_vec()).map_err(|e| ChainError::Decode {
        reason: e.to_string(),
    })
}

/// Returns Result<usize, ChainError> of the byte offset a top level dynamic tuple starts at
pub fn tuple_offset(data: &[u8]) -> Result<usize, ChainError> {
    check_present(data)?;
    usize_at(data, 0)
}

/// Returns Result<Address, AddressError> from parsing a 0x-prefixed or bare hex address
///
/// # Arguments
///
/// * `value` - hex string
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).context(AddressHexSnafu)?;
    ensure!(bytes.len() == 20, AddressLengthSnafu { len: bytes.len() });
    Ok(Address::from_slice(&bytes))
}

/// Returns String of the address as lowercase 0x-prefixed hex
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}
