//! # Ring Confidential Transactions (RingCT)
//! Commitments and the ECDH exchange that hides output amounts from everyone but the
//! recipient

#[macro_use]
extern crate lazy_static;

use crypto::ecc::{CompressedPoint, Point};

mod error;
mod ringct;

pub use error::{Error, Result};
pub use ringct::{decode, ecdh_utils, encode, Commitment, ECDHTuple, RingCTBase, RingCTType};

lazy_static! {
    /// The second generator `H` of Pedersen commitments, `H = 8 * to_point(keccak(G))`
    pub static ref MASK_BASEPOINT: Point = CompressedPoint([
        0x8b, 0x65, 0x59, 0x70, 0x15, 0x37, 0x99, 0xaf, 0x2a, 0xea, 0xdc, 0x9f, 0xf1, 0xad, 0xd0,
        0xea, 0x6c, 0x72, 0x51, 0xd5, 0x41, 0x54, 0xcf, 0xa9, 0x2c, 0x17, 0x3a, 0x0d, 0xd3, 0x9c,
        0x1f, 0x94,
    ])
    .decompress()
    .expect("H is a valid curve point");
}
