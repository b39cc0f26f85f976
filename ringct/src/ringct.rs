use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crypto::{
    curve25519_dalek::traits::MultiscalarMul,
    ecc::{Point, BASEPOINT},
    PublicKey, ScalarExt, SecretKey,
};
use ensure_macro::ensure;

use crate::{Error, Result, MASK_BASEPOINT};

pub mod ecdh_utils {
    use crypto::{ecc, CNFastHash, Hash256Data, SecretKey};

    /// H_s(key)
    pub fn ecdh_hash(key: &SecretKey) -> SecretKey {
        ecc::hash_data_to_scalar(key.as_bytes())
    }

    /// keccak("amount" || shared secret), XOR'd with the amount of compact outputs
    pub fn amount_factor(shared_secret: &SecretKey) -> Hash256Data {
        let mut hasher = CNFastHash::new();
        hasher.input(b"amount");
        hasher.input(shared_secret.as_bytes());
        hasher.result()
    }

    /// H_s("commitment_mask" || shared secret), the blinding factor of compact outputs
    pub fn commitment_mask(shared_secret: &SecretKey) -> SecretKey {
        let mut hasher = CNFastHash::new();
        hasher.input(b"commitment_mask");
        hasher.input(shared_secret.as_bytes());
        ecc::hash_to_scalar(hasher.result())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// ECDH encoded tuple of amount and mask
pub struct ECDHTuple {
    /// Encoded mask (all zero for compact types, where the mask is derived instead)
    pub mask: [u8; 32],
    /// Encoded amount. Compact types only use the first 8 bytes
    pub amount: [u8; 32],
}

/// Pedersen Commitments
///
/// `C = aG + bH`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// The amount being transacted `b`
    pub amount: u64,
    /// The blinding factor `a`
    pub mask: SecretKey,
}

impl Commitment {
    /// Returns the result of the commitment
    ///
    /// Computes `C` where `C = aG + bH`
    pub fn to_public(&self) -> Point {
        Point::multiscalar_mul(
            &[self.mask, SecretKey::from(self.amount)],
            &[BASEPOINT, *MASK_BASEPOINT],
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RingCTType {
    Null = 0,
    Full = 1,
    Simple = 2,
    Bulletproof = 3,
    Bulletproof2 = 4,
    CLSAG = 5,
    BulletproofPlus = 6,
}

impl RingCTType {
    /// Whether outputs of this type use the compact 8 byte amount encoding with a derived mask
    pub fn is_compact(self) -> bool {
        match self {
            RingCTType::Bulletproof2 | RingCTType::CLSAG | RingCTType::BulletproofPlus => true,
            _ => false,
        }
    }
}

impl Default for RingCTType {
    fn default() -> Self {
        RingCTType::Null
    }
}

impl TryFrom<u8> for RingCTType {
    type Error = Error;
    fn try_from(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => RingCTType::Null,
            1 => RingCTType::Full,
            2 => RingCTType::Simple,
            3 => RingCTType::Bulletproof,
            4 => RingCTType::Bulletproof2,
            5 => RingCTType::CLSAG,
            6 => RingCTType::BulletproofPlus,
            _ => return Err(Error::UnsupportedType(tag)),
        })
    }
}

/// The non-prunable part of a RingCT signature
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RingCTBase {
    pub signature_type: RingCTType,
    pub ecdh_exchange: Vec<ECDHTuple>,
    pub output_commitments: Vec<PublicKey>,
    pub fee: u64,
}

/// Hides the amount and mask of `commitment` behind the given shared secret
///
/// The shared secret is the output's derivation scalar H_s(rA || output_index)
pub fn encode(
    signature_type: RingCTType,
    commitment: &Commitment,
    shared_secret: &SecretKey,
) -> Result<ECDHTuple> {
    ensure!(
        signature_type != RingCTType::Null,
        Error::UnsupportedType(signature_type as u8)
    );

    if signature_type.is_compact() {
        let factor = ecdh_utils::amount_factor(shared_secret);
        let mut amount = [0; 32];
        for (i, byte) in commitment.amount.to_le_bytes().iter().enumerate() {
            amount[i] = byte ^ factor[i];
        }
        return Ok(ECDHTuple {
            mask: [0; 32],
            amount,
        });
    }

    let hashed = ecdh_utils::ecdh_hash(shared_secret);
    Ok(ECDHTuple {
        mask: (commitment.mask + hashed).to_bytes(),
        amount: (SecretKey::from(commitment.amount) + ecdh_utils::ecdh_hash(&hashed)).to_bytes(),
    })
}

/// Recovers the amount and mask of output `output_index` and checks them against the
/// output's commitment
pub fn decode(
    signature: &RingCTBase,
    output_index: usize,
    shared_secret: &SecretKey,
) -> Result<Commitment> {
    ensure!(
        signature.signature_type != RingCTType::Null,
        Error::UnsupportedType(signature.signature_type as u8)
    );

    let ecdh = signature
        .ecdh_exchange
        .get(output_index)
        .ok_or(Error::MissingEcdhInfo(output_index))?;
    let expected = signature
        .output_commitments
        .get(output_index)
        .ok_or(Error::MissingCommitment(output_index))?;

    let commitment = if signature.signature_type.is_compact() {
        let factor = ecdh_utils::amount_factor(shared_secret);
        let mut amount = [0; 8];
        for (i, byte) in amount.iter_mut().enumerate() {
            *byte = ecdh.amount[i] ^ factor[i];
        }
        Commitment {
            amount: u64::from_le_bytes(amount),
            mask: ecdh_utils::commitment_mask(shared_secret),
        }
    } else {
        let hashed = ecdh_utils::ecdh_hash(shared_secret);
        let mask = SecretKey::from_slice(&ecdh.mask) - hashed;
        let amount = SecretKey::from_slice(&ecdh.amount) - ecdh_utils::ecdh_hash(&hashed);
        let mut amount_bytes = [0; 8];
        amount_bytes.copy_from_slice(&amount.as_bytes()[..8]);
        Commitment {
            amount: u64::from_le_bytes(amount_bytes),
            mask,
        }
    };

    ensure!(
        &commitment.to_public().compress() == expected,
        Error::CommitmentMismatch(output_index)
    );

    Ok(commitment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto::ecc;

    fn shared_secret(seed: &[u8]) -> SecretKey {
        ecc::hash_data_to_scalar(seed)
    }

    fn signature_for(signature_type: RingCTType, amounts: &[u64]) -> RingCTBase {
        let mut signature = RingCTBase {
            signature_type,
            fee: 1000,
            ..Default::default()
        };
        for (i, amount) in amounts.iter().enumerate() {
            let secret = shared_secret(&[i as u8]);
            let mask = if signature_type.is_compact() {
                ecdh_utils::commitment_mask(&secret)
            } else {
                ecc::hash_data_to_scalar(b"mask")
            };
            let commitment = Commitment {
                amount: *amount,
                mask,
            };
            signature
                .ecdh_exchange
                .push(encode(signature_type, &commitment, &secret).unwrap());
            signature
                .output_commitments
                .push(commitment.to_public().compress());
        }
        signature
    }

    #[test]
    fn it_recovers_amounts_of_every_supported_type() {
        for signature_type in &[
            RingCTType::Full,
            RingCTType::Simple,
            RingCTType::Bulletproof,
            RingCTType::Bulletproof2,
            RingCTType::CLSAG,
            RingCTType::BulletproofPlus,
        ] {
            let signature = signature_for(*signature_type, &[1_000_000_000_000, 42]);

            let first = decode(&signature, 0, &shared_secret(&[0])).unwrap();
            let second = decode(&signature, 1, &shared_secret(&[1])).unwrap();

            assert_eq!(first.amount, 1_000_000_000_000);
            assert_eq!(second.amount, 42);
        }
    }

    #[test]
    fn it_rejects_the_wrong_shared_secret() {
        let signature = signature_for(RingCTType::CLSAG, &[5000]);
        match decode(&signature, 0, &shared_secret(b"wrong")) {
            Err(Error::CommitmentMismatch(0)) => {}
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn it_rejects_null_signatures_and_missing_outputs() {
        let signature = signature_for(RingCTType::Bulletproof, &[7]);
        assert!(matches!(
            decode(&signature, 1, &shared_secret(&[1])),
            Err(Error::MissingEcdhInfo(1))
        ));

        let null = RingCTBase::default();
        assert!(matches!(
            decode(&null, 0, &shared_secret(&[0])),
            Err(Error::UnsupportedType(0))
        ));
        assert!(matches!(
            RingCTType::try_from(9),
            Err(Error::UnsupportedType(9))
        ));
    }

    #[test]
    fn compact_amounts_only_use_eight_bytes() {
        let signature = signature_for(RingCTType::BulletproofPlus, &[u64::max_value()]);
        assert_eq!(signature.ecdh_exchange[0].mask, [0; 32]);
        assert_eq!(&signature.ecdh_exchange[0].amount[8..], &[0; 24][..]);
    }

    #[test]
    fn h_is_not_the_basepoint() {
        assert_ne!(*MASK_BASEPOINT, BASEPOINT);
        assert_eq!(
            hex::encode(MASK_BASEPOINT.compress().as_bytes()),
            "8b655970153799af2aeadc9ff1add0ea6c7251d54154cfa92c173a0dd39c1f94"
        );
    }
}
