use crate::{hash::Hash256Data, CNFastHash};

/// Helper Extension Trait for Scalar
pub trait ScalarExt {
    /// Generates a Scalar from a [u8] slice
    ///
    /// The constructor for Scalar requires a [u8; 32] (for obvious reasons)
    /// However, the code for converting between a slice and [u8; 32] tends to be repeated,
    /// hence, this common implementation
    fn from_slice(data: &[u8]) -> Scalar {
        let mut scalar: [u8; 32] = [0; 32];
        scalar.copy_from_slice(data);
        Scalar::from_bytes_mod_order(scalar)
    }
}

impl ScalarExt for Scalar {}

/// Helper Extension Trait for compressed points
pub trait PointExt {
    /// Whether the compressed bytes decode to a point on the curve
    fn is_valid_point(&self) -> bool;
}

impl PointExt for CompressedPoint {
    fn is_valid_point(&self) -> bool {
        self.decompress().is_some()
    }
}

pub use curve25519_dalek::constants::ED25519_BASEPOINT_COMPRESSED as BASEPOINT_COMPRESSED;
pub use curve25519_dalek::constants::ED25519_BASEPOINT_POINT as BASEPOINT;
pub use curve25519_dalek::edwards::CompressedEdwardsY as CompressedPoint;
pub use curve25519_dalek::edwards::EdwardsPoint as Point;
pub use curve25519_dalek::scalar::Scalar;

/// Converts a given hash to a `Scalar`
pub fn hash_to_scalar(hash: Hash256Data) -> Scalar {
    Scalar::from_bytes_mod_order(hash)
}

/// H_s(data): Keccak the data and reduce the result modulo the group order
pub fn hash_data_to_scalar(data: &[u8]) -> Scalar {
    hash_to_scalar(CNFastHash::digest(data))
}

/// Converts a given compressed point to a `Point` in the prime order subgroup
///
/// Equivalent to Monero's `hash_to_ec`: Keccak, ge_fromfe_frombytes_vartime, then
/// multiplication by the cofactor
pub fn hash_to_point(point: &CompressedPoint) -> Point {
    monero_generators::hash_to_point(point.to_bytes())
}

/// Computes `scalar * G`
pub fn scalar_mul_base(scalar: &Scalar) -> Point {
    Point::mul_base(scalar)
}
