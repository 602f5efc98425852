//! Hand-rolled calldata and return-data handling
//!
//! Only the fixed-width shapes the monitored contracts need are supported:
//! bool, uint256, int256 and raw multi-word returns. Selectors are derived
//! from the canonical signature (`name(type1,type2)`, types only).

use alloy::primitives::{keccak256, Address, Bytes, I256, U256};

use crate::error::DecodeError;

/// Size of one ABI word
pub const WORD: usize = 32;

/// First 4 bytes of keccak256 over a canonical function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Left-pad an address to a 32-byte argument word
pub fn address_word(address: Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Big-endian 32-byte word for an unsigned integer argument
pub fn uint_word(value: U256) -> [u8; WORD] {
    value.to_be_bytes::<WORD>()
}

/// One read-only contract invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEnvelope {
    pub target: Address,
    pub selector: [u8; 4],
    pub args: Vec<[u8; WORD]>,
}

impl CallEnvelope {
    /// Envelope for a zero-argument function
    pub fn new(target: Address, signature: &str) -> Self {
        Self {
            target,
            selector: selector(signature),
            args: Vec::new(),
        }
    }

    pub fn with_address_arg(mut self, address: Address) -> Self {
        self.args.push(address_word(address));
        self
    }

    /// Selector followed by the argument words
    pub fn calldata(&self) -> Bytes {
        let mut data = Vec::with_capacity(4 + self.args.len() * WORD);
        data.extend_from_slice(&self.selector);
        for word in &self.args {
            data.extend_from_slice(word);
        }
        Bytes::from(data)
    }
}

/// Decoded call result; which variant applies is fixed by the contract category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedResult {
    Boolean(bool),
    UnsignedInt256(U256),
    SignedInt256(I256),
    RawBytes(Bytes),
}

/// Word `index` of a return buffer
pub fn word(raw: &[u8], index: usize) -> Result<&[u8], DecodeError> {
    let start = index * WORD;
    let end = start + WORD;
    if raw.len() < end {
        return Err(DecodeError::ShortBuffer {
            needed: end,
            actual: raw.len(),
        });
    }
    Ok(&raw[start..end])
}

/// True iff the last byte of the first word is 1
pub fn as_bool(raw: &[u8]) -> Result<bool, DecodeError> {
    let first = word(raw, 0)?;
    Ok(first[WORD - 1] == 1)
}

pub fn as_uint256(raw: &[u8]) -> Result<U256, DecodeError> {
    uint_at(raw, 0)
}

/// Unsigned value of word `index`
pub fn uint_at(raw: &[u8], index: usize) -> Result<U256, DecodeError> {
    let w = word(raw, index)?;
    Ok(U256::from_be_slice(w))
}

/// Two's-complement signed value of the first word
pub fn as_int256(raw: &[u8]) -> Result<I256, DecodeError> {
    Ok(I256::from_raw(as_uint256(raw)?))
}

pub fn as_raw(raw: &[u8]) -> Bytes {
    Bytes::copy_from_slice(raw)
}

/// Convert an unsigned fixed-point integer to `f64`, dividing by `10^decimals`
pub fn scaled_u256(value: U256, decimals: u8) -> Result<f64, DecodeError> {
    let whole: f64 = value
        .to_string()
        .parse()
        .map_err(|e| DecodeError::OutOfRange(format!("{value}: {e}")))?;
    Ok(whole / 10f64.powi(i32::from(decimals)))
}

/// Signed counterpart of [`scaled_u256`]
pub fn scaled_i256(value: I256, decimals: u8) -> Result<f64, DecodeError> {
    let magnitude = scaled_u256(value.unsigned_abs(), decimals)?;
    Ok(if value.is_negative() { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_with_last(byte: u8) -> Vec<u8> {
        let mut w = vec![0u8; 32];
        w[31] = byte;
        w
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("paused()")), "5c975abb");
        assert_eq!(hex::encode(selector("getPaused(address)")), "b55d9904");
        assert_eq!(hex::encode(selector("latestAnswer()")), "50d25bcd");
        assert_eq!(hex::encode(selector("totalSupply()")), "18160ddd");
        assert_ne!(selector("paused()"), selector("getPaused(address)"));
    }

    #[test]
    fn test_selector_is_deterministic() {
        assert_eq!(
            selector("getReserveCaps(address)"),
            selector("getReserveCaps(address)")
        );
        assert_eq!(hex::encode(selector("getReserveCaps(address)")), "46fbe558");
    }

    #[test]
    fn test_as_bool() {
        assert!(as_bool(&word_with_last(1)).unwrap());
        assert!(!as_bool(&word_with_last(0)).unwrap());

        let mut longer = word_with_last(1);
        longer.extend_from_slice(&[0u8; 32]);
        assert!(as_bool(&longer).unwrap());
    }

    #[test]
    fn test_as_bool_short_buffer() {
        let err = as_bool(&[0u8; 31]).unwrap_err();
        assert_eq!(err, DecodeError::ShortBuffer { needed: 32, actual: 31 });
        assert!(as_bool(&[]).is_err());
    }

    #[test]
    fn test_calldata_pads_address() {
        let asset: Address = "0x4200000000000000000000000000000000000006".parse().unwrap();
        let call = CallEnvelope::new(Address::ZERO, "getPaused(address)").with_address_arg(asset);
        let data = call.calldata();

        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &selector("getPaused(address)"));
        assert!(data[4..16].iter().all(|b| *b == 0));
        assert_eq!(&data[16..], asset.as_slice());
    }

    #[test]
    fn test_uint_and_word_index() {
        let mut raw = uint_word(U256::from(7u64)).to_vec();
        raw.extend_from_slice(&uint_word(U256::from(5000u64)));

        assert_eq!(as_uint256(&raw).unwrap(), U256::from(7u64));
        assert_eq!(uint_at(&raw, 1).unwrap(), U256::from(5000u64));
        assert!(matches!(
            uint_at(&raw, 2),
            Err(DecodeError::ShortBuffer { needed: 96, actual: 64 })
        ));
    }

    #[test]
    fn test_int256_twos_complement() {
        let raw = [0xffu8; 32];
        let value = as_int256(&raw).unwrap();
        assert_eq!(value, I256::MINUS_ONE);
        assert_eq!(scaled_i256(value, 0).unwrap(), -1.0);
    }

    #[test]
    fn test_scaling() {
        let supply = U256::from(2_500_000_000_000_000_000u128);
        assert_eq!(scaled_u256(supply, 18).unwrap(), 2.5);

        let price = I256::try_from(250_000_000_000i64).unwrap();
        assert_eq!(scaled_i256(price, 8).unwrap(), 2500.0);
    }
}
