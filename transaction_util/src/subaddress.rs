//! Module for handling subaddresses

use std::fmt::{Display, Formatter};

use byteorder::ByteOrder;
use serde::{Deserialize, Serialize};

use crypto::{ecc, CNFastHash, PublicKey, SecretKey};

use crate::{AccountKeys, Address};

/// Tuple of (major, minor) index for a subaddress
#[derive(Debug, Eq, Clone, Copy, Hash, PartialEq, Serialize, Deserialize)]
pub struct SubAddressIndex(pub u32, pub u32);

impl SubAddressIndex {
    /// Index of the primary address
    pub const PRIMARY: SubAddressIndex = SubAddressIndex(0, 0);

    /// Whether this is the index of the primary address
    pub fn is_zero(&self) -> bool {
        self == &SubAddressIndex::PRIMARY
    }
}

impl Display for SubAddressIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// Get the address at a given index from the given account keys
///
/// Fails if the account's public spend key is not a point on the curve
pub fn get_address_for_index(account_keys: &AccountKeys, index: &SubAddressIndex) -> Option<Address> {
    if index.is_zero() {
        return Some(account_keys.address());
    }

    // D = B + mG
    let spend_public_key = get_subaddress_spend_public_key(account_keys, index)?;

    // C = aD
    let view_public_key =
        account_keys.view_keypair.secret_key * spend_public_key.decompress()?;

    Some(Address::subaddress(
        spend_public_key,
        view_public_key.compress(),
    ))
}

/// Get the public spend key of the subaddress at the given index
pub fn get_subaddress_spend_public_key(
    account_keys: &AccountKeys,
    index: &SubAddressIndex,
) -> Option<PublicKey> {
    if index.is_zero() {
        return Some(account_keys.spend_public_key);
    }
    let spend_public_key = account_keys.spend_public_key.decompress()?;
    let subaddress_secret_key = get_subaddress_secret_key(&account_keys.view_keypair.secret_key, index);

    Some((spend_public_key + ecc::scalar_mul_base(&subaddress_secret_key)).compress())
}

/// Get the public spend keys of the minor indices `[begin, end)` in the given major index
pub fn get_subaddress_spend_public_keys(
    account_keys: &AccountKeys,
    major: u32,
    begin: u32,
    end: u32,
) -> Option<Vec<PublicKey>> {
    let spend_public_key = account_keys.spend_public_key.decompress()?;

    Some(
        (begin..end)
            .map(|minor| {
                let index = SubAddressIndex(major, minor);
                if index.is_zero() {
                    return account_keys.spend_public_key;
                }
                let subaddress_secret_key =
                    get_subaddress_secret_key(&account_keys.view_keypair.secret_key, &index);
                (spend_public_key + ecc::scalar_mul_base(&subaddress_secret_key)).compress()
            })
            .collect(),
    )
}

/// Get the secret key used in generating a subaddress in the given index
pub fn get_subaddress_secret_key(
    view_secret_key: &SecretKey,
    SubAddressIndex(major, minor): &SubAddressIndex,
) -> SecretKey {
    // m = H_s("SubAddr" | a | major | minor)
    // Length of buffer = length("SubAddr\0") + length(public_key) + 2 * length(u32)
    //                  = 8 + 32 + 8 = 48
    let mut buffer = [0; 48];

    // SubAddr
    buffer[..8].copy_from_slice(b"SubAddr\0");
    // View secret key
    buffer[8..40].copy_from_slice(view_secret_key.as_bytes());
    // Major index
    byteorder::LittleEndian::write_u32(&mut buffer[40..44], *major);
    // Minor index
    byteorder::LittleEndian::write_u32(&mut buffer[44..48], *minor);

    ecc::hash_to_scalar(CNFastHash::digest(&buffer))
}
