use serde::{Deserialize, Serialize};

use crypto::{CNFastHash, Hash256, Hash256Data, KeyImage, PublicKey};
use ringct::{RingCTBase, RingCTType};

use crate::{extra, ExtraNonce, GetHash};

/// Transaction input
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum TXIn {
    /// Coinbase (genesis) input. Creates new coins
    /// Contains the Block height of this transaction
    Gen(u64),
    /// Coins from an existing "ToKey" output
    FromKey {
        /// Amount bucket of the ring members (0 for RingCT)
        amount: u64,
        /// Relative offsets of each output in the ring
        key_offsets: Vec<u64>,
        /// Key image of the sender's output
        key_image: KeyImage,
    },
}

/// Transaction output target
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum TXOutTarget {
    /// Send to specified public key
    ToKey {
        /// Target public key
        key: PublicKey,
    },
    /// Legacy script hash target. Never owned by an account
    ToScriptHash {
        /// Script hash
        hash: Hash256,
    },
}

/// Transaction output
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TXOut {
    /// Amount of coins received (0 for RingCT)
    pub amount: u64,
    /// Transaction output target
    pub target: TXOutTarget,
}

/// Transaction prefix
#[derive(Clone, Default, Serialize, Deserialize, Debug)]
pub struct TransactionPrefix {
    /// This transaction's version. Version 2 and above carry RingCT signatures
    pub version: usize,
    /// Height or timestamp until which the outputs are locked
    pub unlock_time: u64,
    /// List of inputs to this transaction
    pub inputs: Vec<TXIn>,
    /// List of outputs in this transaction
    pub outputs: Vec<TXOut>,
    /// Raw extra field, see [`crate::parse_extra`]
    pub extra: Vec<u8>,
}

/// A complete Transaction
#[derive(Clone, Default, Serialize, Deserialize, Debug)]
pub struct Transaction {
    /// This transaction's prefix
    pub prefix: TransactionPrefix,

    /// RingCT signature base, hiding the output amounts
    pub rct_signatures: RingCTBase,
}

/// Converts relative ring offsets to absolute output indices (a running sum)
pub fn relative_output_offsets_to_absolute(offsets: &[u64]) -> Vec<u64> {
    offsets
        .iter()
        .scan(0u64, |sum, offset| {
            *sum = sum.wrapping_add(*offset);
            Some(*sum)
        })
        .collect()
}

impl Transaction {
    /// A coinbase transaction has a single generating input
    pub fn is_coinbase(&self) -> bool {
        match self.prefix.inputs.as_slice() {
            [TXIn::Gen(_)] => true,
            _ => false,
        }
    }

    /// Whether amounts are hidden behind RingCT
    pub fn is_rct(&self) -> bool {
        self.prefix.version >= 2
    }

    /// Fee paid by this transaction
    pub fn fee(&self) -> u64 {
        if self.is_coinbase() {
            return 0;
        }
        if self.is_rct() {
            return self.rct_signatures.fee;
        }
        let inputs: u64 = self
            .prefix
            .inputs
            .iter()
            .map(|input| match input {
                TXIn::FromKey { amount, .. } => *amount,
                TXIn::Gen(_) => 0,
            })
            .sum();
        let outputs: u64 = self.prefix.outputs.iter().map(|output| output.amount).sum();
        inputs.saturating_sub(outputs)
    }

    /// See [`crate::tx_public_key_from_extra`]
    pub fn tx_public_key(&self) -> PublicKey {
        extra::tx_public_key_from_extra(&self.prefix.extra)
    }

    /// See [`crate::additional_public_keys_from_extra`]
    pub fn additional_public_keys(&self) -> Vec<PublicKey> {
        extra::additional_public_keys_from_extra(&self.prefix.extra)
    }

    /// See [`crate::extra_nonce_from_extra`]
    pub fn extra_nonce(&self) -> Option<ExtraNonce> {
        extra::extra_nonce_from_extra(&self.prefix.extra)
    }
}

impl GetHash for TransactionPrefix {
    fn get_hash_blob(&self) -> Vec<u8> {
        let mut vec = Vec::new();

        // Tx version
        vec.extend_from_slice(&varint::serialize(self.version as u64));

        // Unlock time
        vec.extend_from_slice(&varint::serialize(self.unlock_time));

        // Inputs
        vec.extend_from_slice(&varint::serialize(self.inputs.len() as u64));
        for input in &self.inputs {
            match input {
                TXIn::Gen(height) => {
                    // Enum tag
                    vec.push(0xff);

                    vec.extend_from_slice(&varint::serialize(*height));
                }
                TXIn::FromKey {
                    amount,
                    key_offsets,
                    key_image,
                } => {
                    // Enum tag
                    vec.push(0x02);

                    vec.extend_from_slice(&varint::serialize(*amount));
                    vec.extend_from_slice(&varint::serialize(key_offsets.len() as u64));
                    for offset in key_offsets {
                        vec.extend_from_slice(&varint::serialize(*offset));
                    }
                    vec.extend_from_slice(key_image.as_bytes());
                }
            }
        }

        // Outputs
        vec.extend_from_slice(&varint::serialize(self.outputs.len() as u64));
        for output in &self.outputs {
            vec.extend_from_slice(&varint::serialize(output.amount));

            match &output.target {
                TXOutTarget::ToKey { key } => {
                    vec.push(0x02);
                    vec.extend_from_slice(key.as_bytes());
                }
                TXOutTarget::ToScriptHash { hash } => {
                    vec.push(0x01);
                    vec.extend_from_slice(hash.data());
                }
            }
        }

        // Extra
        vec.extend_from_slice(&varint::serialize(self.extra.len() as u64));
        vec.extend_from_slice(&self.extra);
        vec
    }
}

impl GetHash for RingCTBase {
    fn get_hash_blob(&self) -> Vec<u8> {
        let mut vec = vec![self.signature_type as u8];
        if self.signature_type == RingCTType::Null {
            return vec;
        }

        vec.extend_from_slice(&varint::serialize(self.fee));
        for tuple in &self.ecdh_exchange {
            if self.signature_type.is_compact() {
                vec.extend_from_slice(&tuple.amount[..8]);
            } else {
                vec.extend_from_slice(&tuple.mask);
                vec.extend_from_slice(&tuple.amount);
            }
        }
        for commitment in &self.output_commitments {
            vec.extend_from_slice(commitment.as_bytes());
        }
        vec
    }
}

impl GetHash for Transaction {
    fn get_hash_blob(&self) -> Vec<u8> {
        self.prefix.get_hash_blob()
    }
    fn get_hash(&self) -> Hash256 {
        if !self.is_rct() {
            return Hash256::from(CNFastHash::digest(&self.get_hash_blob()));
        }
        let hashes: [Hash256Data; 3] = [
            // Prefix hash
            CNFastHash::digest(&self.get_hash_blob()),
            // RingCT base hash
            *self.rct_signatures.get_hash().data(),
            // Prunable data is not kept
            [0; 32],
        ];

        Hash256::from(CNFastHash::digest(&hashes.concat()))
    }
}
