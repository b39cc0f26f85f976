use std::convert::TryInto;

use serde::{Deserialize, Serialize};

use crate::ecc::{scalar_mul_base, CompressedPoint, Scalar};

/// An unsigned 256-bit value used as a private key. Represented with lowercase letters
pub type SecretKey = Scalar;

/// A point on the elliptic curve in its 32 byte wire form. Usually determined by
/// multiplication of a scalar to the curve basepoint
///
/// Kept compressed since keys read from transactions are not guaranteed to be valid points
pub type PublicKey = CompressedPoint;

/// Type alias specific to Cryptonote
pub type KeyImage = PublicKey;

/// A pair of a given secret key and its corresponding public key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyPair {
    /// The secret key
    pub secret_key: SecretKey,
    /// The public key
    pub public_key: PublicKey,
}

impl From<Scalar> for KeyPair {
    fn from(secret_key: SecretKey) -> Self {
        let public_key = scalar_mul_base(&secret_key).compress();
        Self {
            secret_key,
            public_key,
        }
    }
}

/// Parses a hex encoded secret key
///
/// Only canonical (fully reduced) scalars are accepted
pub fn parse_secret_key(data: &str) -> Option<SecretKey> {
    let bytes: [u8; 32] = hex::decode(data).ok()?.as_slice().try_into().ok()?;
    Option::from(Scalar::from_canonical_bytes(bytes))
}

/// Parses a hex encoded public key. The bytes are not checked to be on the curve
pub fn parse_public_key(data: &str) -> Option<PublicKey> {
    let bytes: [u8; 32] = hex::decode(data).ok()?.as_slice().try_into().ok()?;
    Some(CompressedPoint(bytes))
}
