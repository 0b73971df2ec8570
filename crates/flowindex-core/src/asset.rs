//! Asset id derivation.
//!
//! The protocol identifies an asset either by a plain numeric id or by the
//! ERC-20 token address it wraps. In the latter case the id is derived by
//! reversing the 20 raw address bytes and reading them as an unsigned
//! big-endian integer.

use alloy_primitives::{Address, U256};

/// Derive the asset id for an ERC-20 token address.
///
/// Reversing the bytes and reading big-endian is the same as reading the
/// address bytes little-endian.
pub fn asset_id_for_token(token: Address) -> U256 {
    U256::from_le_slice(token.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn zero_address_is_zero() {
        assert_eq!(asset_id_for_token(Address::ZERO), U256::ZERO);
    }

    #[test]
    fn derivation_reverses_bytes() {
        // 0x…01 reversed becomes the high byte of a 20-byte big-endian value.
        let token = address!("0000000000000000000000000000000000000001");
        let expected = U256::from(1u8) << (19usize * 8);
        assert_eq!(asset_id_for_token(token), expected);
    }

    #[test]
    fn distinct_addresses_distinct_ids() {
        let a = address!("00000000000000000000000000000000000000aa");
        let b = address!("aa00000000000000000000000000000000000000");
        assert_ne!(asset_id_for_token(a), asset_id_for_token(b));
        // Leading zero bytes of the address land in the low bytes of the id.
        assert_eq!(asset_id_for_token(b), U256::from(0xaau8));
    }
}
