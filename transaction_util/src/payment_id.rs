//! Module for encrypting and decrypting payment IDs (one XOR operation for both)

use crypto::{CNFastHash, Hash8, Hash8Data};

use crate::derivation::Derivation;

const ENCRYPTED_PAYMENT_ID_TAIL: u8 = 0x8d;

/// Encrypts a payment ID
///
/// Encryption is done by taking a hash of a shared key derivation and
/// bitwise XOR'ing it with the payment ID. Decryption is the same operation
pub fn encrypt(payment_id: Hash8, key_derivation: &Derivation) -> Hash8 {
    let mut hasher = CNFastHash::new();

    hasher.input(key_derivation.to_bytes());
    hasher.input(&[ENCRYPTED_PAYMENT_ID_TAIL]);

    let hash = hasher.result();

    let mut encrypted: Hash8Data = [0; 8];
    for (i, byte) in encrypted.iter_mut().enumerate() {
        *byte = payment_id.data()[i] ^ hash[i];
    }
    Hash8::from(encrypted)
}
