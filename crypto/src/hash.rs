use std::convert::{From, TryFrom};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

pub type Hash256Data = [u8; 32];
pub type Hash8Data = [u8; 8];

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Hash256(Hash256Data);

impl Hash256 {
    pub fn null_hash() -> Self {
        Hash256([0; 32])
    }
    pub fn data(&self) -> &Hash256Data {
        &self.0
    }
    pub fn is_null(&self) -> bool {
        self.0 == [0; 32]
    }
}

impl Display for Hash256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<Hash256Data> for Hash256 {
    fn from(data: Hash256Data) -> Self {
        Hash256(data)
    }
}

impl TryFrom<&str> for Hash256 {
    type Error = hex::FromHexError;
    fn try_from(data: &str) -> Result<Self, Self::Error> {
        let mut hash = [0; 32];
        hex::decode_to_slice(data, &mut hash)?;
        Ok(Hash256(hash))
    }
}

/// Short (8 byte) hash, used for encrypted payment IDs
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Hash8(Hash8Data);

impl Hash8 {
    pub fn null_hash() -> Self {
        Hash8([0; 8])
    }
    pub fn data(&self) -> &Hash8Data {
        &self.0
    }
    pub fn is_null(&self) -> bool {
        self.0 == [0; 8]
    }
}

impl Display for Hash8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<Hash8Data> for Hash8 {
    fn from(data: Hash8Data) -> Self {
        Hash8(data)
    }
}

impl TryFrom<&str> for Hash8 {
    type Error = hex::FromHexError;
    fn try_from(data: &str) -> Result<Self, Self::Error> {
        let mut hash = [0; 8];
        hex::decode_to_slice(data, &mut hash)?;
        Ok(Hash8(hash))
    }
}

/// Keccak-256 with the original (pre-SHA3) padding, Cryptonote's `cn_fast_hash`
#[derive(Clone, Default)]
pub struct CNFastHash {
    hasher: Keccak256,
}

impl CNFastHash {
    pub fn new() -> Self {
        CNFastHash {
            hasher: Keccak256::new(),
        }
    }
    pub fn input<B: AsRef<[u8]>>(&mut self, data: B) {
        self.hasher.update(data);
    }
    pub fn chain<B: AsRef<[u8]>>(self, data: B) -> Self {
        CNFastHash {
            hasher: self.hasher.chain_update(data),
        }
    }
    pub fn result(self) -> Hash256Data {
        self.hasher.finalize().into()
    }
    pub fn digest(data: &[u8]) -> Hash256Data {
        Keccak256::digest(data).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_hash() {
        assert_eq!(
            Hash256::null_hash().to_string(),
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert!(Hash8::null_hash().is_null());
    }

    #[test]
    fn decodes_correctly() {
        let data: [u8; 32] = [
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
            24, 25, 26, 27, 28, 29, 30, 31, 32,
        ];
        let hash =
            Hash256::try_from("0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20")
                .unwrap();
        assert_eq!(hash.data(), &data);

        let short = Hash8::try_from("0102030405060708").unwrap();
        assert_eq!(short.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn errors_on_invalid_input() {
        assert!(Hash256::try_from("01").is_err());
        assert!(Hash8::try_from("zz00000000000000").is_err());
    }

    #[test]
    fn cn_fast_hash_of_empty_input() {
        // Keccak-256 (not SHA3-256) of the empty string
        assert_eq!(
            hex::encode(CNFastHash::digest(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn incremental_hash_matches_one_shot() {
        let mut hasher = CNFastHash::new();
        hasher.input(b"Sub");
        hasher.input(b"Addr");
        assert_eq!(hasher.result(), CNFastHash::digest(b"SubAddr"));
        assert_eq!(
            CNFastHash::new().chain(b"Sub").chain(b"Addr").result(),
            CNFastHash::digest(b"SubAddr")
        );
    }
}
