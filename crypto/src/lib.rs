//! Elliptic curve and hashing primitives shared by the workspace

pub mod ecc;
pub mod hash;
pub mod keys;

pub use curve25519_dalek;

pub use ecc::ScalarExt;
pub use hash::{CNFastHash, Hash256, Hash256Data, Hash8, Hash8Data};
pub use keys::{KeyImage, KeyPair, PublicKey, SecretKey};
