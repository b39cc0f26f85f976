//! Parsing and serialization of the transaction `extra` field
//!
//! The field is a sequence of tagged entries. Parsing stops at the first entry that
//! cannot be decoded, returning whatever was read up to that point along with a flag
//! indicating whether the whole field was consumed.

use std::convert::{TryFrom, TryInto};

use serde::{Deserialize, Serialize};

use crypto::{ecc::CompressedPoint, Hash256, Hash8, PublicKey};

const TAG_PADDING: u8 = 0x00;
const TAG_PUBKEY: u8 = 0x01;
const TAG_NONCE: u8 = 0x02;
const TAG_MERGE_MINING: u8 = 0x03;
const TAG_ADDITIONAL_PUBKEYS: u8 = 0x04;
const TAG_MINERGATE: u8 = 0xde;

const MAX_PADDING: usize = 255;

const NONCE_PAYMENT_ID: u8 = 0x00;
const NONCE_ENCRYPTED_PAYMENT_ID: u8 = 0x01;

/// A single entry in the transaction extra field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TXExtra {
    /// Zero bytes filling the rest of the field
    Padding(usize),
    /// Public key of this transaction (for determining output secret keys)
    TxPublicKey(PublicKey),
    /// Arbitrary data, usually a payment ID
    TxNonce(Vec<u8>),
    /// Merge mining information
    MergeMiningTag {
        /// Depth of the merkle tree
        depth: u64,
        /// Merkle root of the merge mined chains
        merkle_root: Hash256,
    },
    /// Additional public keys for this transaction, one per output
    TxAdditionalPublicKeys(Vec<PublicKey>),
    /// Pool specific data
    MinerGate(Vec<u8>),
}

/// Contents of a [`TXExtra::TxNonce`] entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExtraNonce {
    /// Unencrypted 32 byte payment ID
    PaymentId(Hash256),
    /// 8 byte payment ID, encrypted towards the recipient
    EncryptedPaymentId(Hash8),
    /// Anything else
    Other(Vec<u8>),
}

impl ExtraNonce {
    /// Interprets raw nonce bytes. The encrypted form is checked first
    pub fn parse(nonce: &[u8]) -> Self {
        if nonce.len() == 9 && nonce[0] == NONCE_ENCRYPTED_PAYMENT_ID {
            if let Ok(data) = <[u8; 8]>::try_from(&nonce[1..]) {
                return ExtraNonce::EncryptedPaymentId(Hash8::from(data));
            }
        }
        if nonce.len() == 33 && nonce[0] == NONCE_PAYMENT_ID {
            if let Ok(data) = <[u8; 32]>::try_from(&nonce[1..]) {
                return ExtraNonce::PaymentId(Hash256::from(data));
            }
        }
        ExtraNonce::Other(nonce.to_vec())
    }

    /// Raw nonce bytes as stored inside a [`TXExtra::TxNonce`]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            ExtraNonce::PaymentId(payment_id) => {
                bytes.push(NONCE_PAYMENT_ID);
                bytes.extend_from_slice(payment_id.data());
            }
            ExtraNonce::EncryptedPaymentId(payment_id) => {
                bytes.push(NONCE_ENCRYPTED_PAYMENT_ID);
                bytes.extend_from_slice(payment_id.data());
            }
            ExtraNonce::Other(data) => bytes.extend_from_slice(data),
        }
        bytes
    }
}

struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    fn byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    fn take(&mut self, length: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(length)?;
        let slice = self.data.get(self.position..end)?;
        self.position = end;
        Some(slice)
    }

    fn varint(&mut self) -> Option<u64> {
        let (value, length) = varint::deserialize(&self.data[self.position..])?;
        self.position += length;
        Some(value)
    }

    fn public_key(&mut self) -> Option<PublicKey> {
        let bytes: [u8; 32] = self.take(32)?.try_into().ok()?;
        Some(CompressedPoint(bytes))
    }

    fn field(&mut self) -> Option<TXExtra> {
        Some(match self.byte()? {
            TAG_PADDING => {
                // Padding runs to the end of the field and must be all zeroes
                let rest = self.take(self.data.len() - self.position)?;
                if rest.len() + 1 > MAX_PADDING || rest.iter().any(|byte| *byte != 0) {
                    return None;
                }
                TXExtra::Padding(rest.len() + 1)
            }
            TAG_PUBKEY => TXExtra::TxPublicKey(self.public_key()?),
            TAG_NONCE => {
                let length = self.byte()? as usize;
                TXExtra::TxNonce(self.take(length)?.to_vec())
            }
            TAG_MERGE_MINING => {
                let length = self.varint()? as usize;
                let mut inner = Reader {
                    data: self.take(length)?,
                    position: 0,
                };
                let depth = inner.varint()?;
                let merkle_root: [u8; 32] = inner.take(32)?.try_into().ok()?;
                TXExtra::MergeMiningTag {
                    depth,
                    merkle_root: Hash256::from(merkle_root),
                }
            }
            TAG_ADDITIONAL_PUBKEYS => {
                let count = self.varint()?;
                // Bail before allocating if the field cannot possibly hold that many keys
                if count > ((self.data.len() - self.position) / 32) as u64 {
                    return None;
                }
                let mut keys = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    keys.push(self.public_key()?);
                }
                TXExtra::TxAdditionalPublicKeys(keys)
            }
            TAG_MINERGATE => {
                let length = self.varint()? as usize;
                TXExtra::MinerGate(self.take(length)?.to_vec())
            }
            _ => return None,
        })
    }
}

/// Parses the extra field of a transaction
///
/// # Returns
/// The entries that could be parsed and whether the entire field was parsed
pub fn parse_extra(extra: &[u8]) -> (Vec<TXExtra>, bool) {
    let mut reader = Reader {
        data: extra,
        position: 0,
    };
    let mut fields = Vec::new();

    while !reader.is_empty() {
        match reader.field() {
            Some(field) => fields.push(field),
            None => {
                log::trace!(
                    "Extra field parsed up to byte {} of {}",
                    reader.position,
                    extra.len()
                );
                return (fields, false);
            }
        }
    }

    (fields, true)
}

/// Serializes entries into the wire form read by [`parse_extra`]
pub fn serialize_extra(fields: &[TXExtra]) -> Vec<u8> {
    let mut extra = Vec::new();
    for field in fields {
        match field {
            TXExtra::Padding(size) => {
                extra.push(TAG_PADDING);
                extra.extend(std::iter::repeat(0).take(size.saturating_sub(1)));
            }
            TXExtra::TxPublicKey(key) => {
                extra.push(TAG_PUBKEY);
                extra.extend_from_slice(key.as_bytes());
            }
            TXExtra::TxNonce(nonce) => {
                extra.push(TAG_NONCE);
                extra.push(nonce.len() as u8);
                extra.extend_from_slice(nonce);
            }
            TXExtra::MergeMiningTag { depth, merkle_root } => {
                let mut inner = varint::serialize(*depth);
                inner.extend_from_slice(merkle_root.data());
                extra.push(TAG_MERGE_MINING);
                extra.extend_from_slice(&varint::serialize(inner.len() as u64));
                extra.extend_from_slice(&inner);
            }
            TXExtra::TxAdditionalPublicKeys(keys) => {
                extra.push(TAG_ADDITIONAL_PUBKEYS);
                extra.extend_from_slice(&varint::serialize(keys.len() as u64));
                for key in keys {
                    extra.extend_from_slice(key.as_bytes());
                }
            }
            TXExtra::MinerGate(data) => {
                extra.push(TAG_MINERGATE);
                extra.extend_from_slice(&varint::serialize(data.len() as u64));
                extra.extend_from_slice(data);
            }
        }
    }
    extra
}

/// Gets the transaction public key used when scanning for received outputs
///
/// A historical bug left some transactions with two public keys in extra. When that is
/// the case the second one is used. Partially parsed fields are still searched, and the
/// null key is returned when there is no public key at all.
pub fn tx_public_key_from_extra(extra: &[u8]) -> PublicKey {
    let (fields, _) = parse_extra(extra);
    let mut keys = fields.iter().filter_map(|field| match field {
        TXExtra::TxPublicKey(key) => Some(*key),
        _ => None,
    });

    match (keys.next(), keys.next()) {
        (_, Some(second)) => second,
        (Some(first), None) => first,
        (None, None) => CompressedPoint([0; 32]),
    }
}

/// Gets the additional public keys from extra, empty if there are none
pub fn additional_public_keys_from_extra(extra: &[u8]) -> Vec<PublicKey> {
    let (fields, _) = parse_extra(extra);
    fields
        .into_iter()
        .find_map(|field| match field {
            TXExtra::TxAdditionalPublicKeys(keys) => Some(keys),
            _ => None,
        })
        .unwrap_or_default()
}

/// Gets the first nonce in extra. Requires the whole field to parse
pub fn extra_nonce_from_extra(extra: &[u8]) -> Option<ExtraNonce> {
    let (fields, complete) = parse_extra(extra);
    if !complete {
        return None;
    }
    fields.into_iter().find_map(|field| match field {
        TXExtra::TxNonce(nonce) => Some(ExtraNonce::parse(&nonce)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto::ecc::BASEPOINT_COMPRESSED;

    fn key(byte: u8) -> PublicKey {
        CompressedPoint([byte; 32])
    }

    #[test]
    fn it_parses_a_typical_extra_field() {
        let fields = vec![
            TXExtra::TxPublicKey(BASEPOINT_COMPRESSED),
            TXExtra::TxNonce(ExtraNonce::EncryptedPaymentId(Hash8::from([7; 8])).to_bytes()),
            TXExtra::TxAdditionalPublicKeys(vec![key(1), key(2)]),
            TXExtra::MergeMiningTag {
                depth: 3,
                merkle_root: Hash256::from([9; 32]),
            },
            TXExtra::MinerGate(vec![1, 2, 3]),
            TXExtra::Padding(4),
        ];

        let (parsed, complete) = parse_extra(&serialize_extra(&fields));
        assert!(complete);
        assert_eq!(parsed, fields);
    }

    #[test]
    fn it_keeps_fields_parsed_before_garbage() {
        let mut extra = serialize_extra(&[TXExtra::TxPublicKey(key(5))]);
        extra.extend_from_slice(&[0x99, 0x01]);

        let (parsed, complete) = parse_extra(&extra);
        assert!(!complete);
        assert_eq!(parsed, vec![TXExtra::TxPublicKey(key(5))]);
        assert_eq!(tx_public_key_from_extra(&extra), key(5));
    }

    #[test]
    fn it_rejects_non_zero_padding_and_truncated_keys() {
        assert!(!parse_extra(&[TAG_PADDING, 0, 1]).1);
        assert!(!parse_extra(&[TAG_PUBKEY, 1, 2, 3]).1);
        assert!(!parse_extra(&[TAG_NONCE, 10, 1]).1);
        assert!(!parse_extra(&[TAG_ADDITIONAL_PUBKEYS, 0xff, 0xff, 0x03]).1);
    }

    #[test]
    fn the_second_public_key_wins() {
        let extra = serialize_extra(&[TXExtra::TxPublicKey(key(1)), TXExtra::TxPublicKey(key(2))]);
        assert_eq!(tx_public_key_from_extra(&extra), key(2));

        assert_eq!(tx_public_key_from_extra(&[]), CompressedPoint([0; 32]));
    }

    #[test]
    fn it_extracts_nonces() {
        let encrypted = ExtraNonce::EncryptedPaymentId(Hash8::from([1; 8]));
        let legacy = ExtraNonce::PaymentId(Hash256::from([2; 32]));
        for nonce in &[encrypted, legacy] {
            let extra = serialize_extra(&[
                TXExtra::TxPublicKey(key(1)),
                TXExtra::TxNonce(nonce.to_bytes()),
            ]);
            assert_eq!(extra_nonce_from_extra(&extra).as_ref(), Some(nonce));
        }

        // A nonce is not trusted when the field around it is broken
        let mut extra = serialize_extra(&[TXExtra::TxNonce(vec![0x01; 9])]);
        extra.push(0x42);
        assert_eq!(extra_nonce_from_extra(&extra), None);

        assert_eq!(ExtraNonce::parse(&[5, 5]), ExtraNonce::Other(vec![5, 5]));
    }

    #[test]
    fn it_reads_additional_public_keys() {
        let extra = serialize_extra(&[
            TXExtra::TxPublicKey(key(1)),
            TXExtra::TxAdditionalPublicKeys(vec![key(3), key(4)]),
        ]);
        assert_eq!(additional_public_keys_from_extra(&extra), vec![key(3), key(4)]);
        assert!(additional_public_keys_from_extra(&[]).is_empty());
    }
}
