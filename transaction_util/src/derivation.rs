use serde::{Deserialize, Serialize};

use crypto::{
    curve25519_dalek::traits::Identity,
    ecc::{scalar_mul_base, Point, Scalar},
    CNFastHash, PublicKey, ScalarExt,
};

/// Wrapper around the result 8 * (secret key * public key)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Derivation(pub(crate) Point);

impl Derivation {
    /// Create a new derivation from the given secret and public keys
    ///
    /// Fails if the public key is not a point on the curve
    pub fn from(scalar: &Scalar, public_key: &PublicKey) -> Option<Self> {
        let point = public_key.decompress()?;

        Some(Derivation((scalar * point).mul_by_cofactor()))
    }

    /// The identity derivation. Outputs scanned with it never match
    pub fn identity() -> Self {
        Derivation(Point::identity())
    }

    /// Wire form of this derivation
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    /// Convert this derivation into a Scalar
    /// H_s(derivation || output_index)
    pub fn to_scalar(&self, output_index: u64) -> Scalar {
        let mut hasher = CNFastHash::new();

        hasher.input(self.0.compress().as_bytes());
        hasher.input(varint::serialize(output_index));

        Scalar::from_slice(&hasher.result())
    }

    /// H_s(derivation || output_index) * G
    pub(crate) fn to_point(&self, output_index: u64) -> Point {
        scalar_mul_base(&self.to_scalar(output_index))
    }
}
