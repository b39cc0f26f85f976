use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::{TXOutTarget, Transaction};
use crypto::{PublicKey, SecretKey};
use transaction_util::{Derivation, SubAddressIndex};

use crate::{
    Error, Identified, Identifier, IdentifierKind, Result, ScanKeys, MAX_MAJOR_EXPANSION,
};

/// RingCT data of an owned output
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RctOutput {
    pub commitment: PublicKey,
    pub ecdh_mask: [u8; 32],
    pub ecdh_amount: [u8; 32],
    /// Decoded blinding factor
    pub mask: SecretKey,
}

/// An output found to belong to the account
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputInfo {
    /// One-time public key of the output
    pub public_key: PublicKey,
    /// Plaintext amount, decoded for RingCT outputs
    pub amount: u64,
    pub index_in_tx: u64,
    /// Derivation the output matched with. Either the main one or the output's
    /// additional derivation
    pub derivation: Derivation,
    pub rct: Option<RctOutput>,
    /// Spend public key of the (sub)address the output was sent to
    pub subaddress_spend_public_key: PublicKey,
    /// Index of the receiving subaddress. Only known when scanning with a subaddress map
    /// or with a subaddress account of known position
    pub subaddress_index: Option<SubAddressIndex>,
}

impl OutputInfo {
    pub fn has_subaddress_index(&self) -> bool {
        self.subaddress_index.is_some()
    }

    /// The receiving index, the primary address when unknown
    pub fn effective_subaddress_index(&self) -> SubAddressIndex {
        self.subaddress_index.unwrap_or(SubAddressIndex::PRIMARY)
    }
}

impl Display for OutputInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.index_in_tx,
            hex::encode(self.public_key.as_bytes()),
            self.amount
        )?;
        if let Some(index) = self.subaddress_index {
            write!(f, ", {}", index)?;
        }
        Ok(())
    }
}

/// Finds the outputs of a transaction sent to an account
pub struct Output<'a> {
    keys: ScanKeys<'a>,
    identified: Vec<OutputInfo>,
    total: u64,
}

impl<'a> Output<'a> {
    pub fn new(keys: ScanKeys<'a>) -> Self {
        Output {
            keys,
            identified: Vec::new(),
            total: 0,
        }
    }

    pub fn outputs(&self) -> &[OutputInfo] {
        &self.identified
    }
}

impl<'a> Identifier for Output<'a> {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Output
    }

    fn identify(
        &mut self,
        tx: &Transaction,
        tx_public_key: &PublicKey,
        additional_public_keys: &[PublicKey],
    ) -> Result<()> {
        self.identified = identify_outputs(&self.keys, tx, tx_public_key, additional_public_keys)?;
        self.total = self.identified.iter().map(|output| output.amount).sum();
        Ok(())
    }

    fn identified(&self) -> Identified<'_> {
        Identified::Outputs(&self.identified)
    }

    fn total(&self) -> u64 {
        self.total
    }
}

/// Scans a transaction's outputs, reading its public keys from the extra field
pub fn scan_transaction(keys: &ScanKeys<'_>, tx: &Transaction) -> Result<Vec<OutputInfo>> {
    identify_outputs(
        keys,
        tx,
        &tx.tx_public_key(),
        &tx.additional_public_keys(),
    )
}

fn derive_or_identity(keys: &ScanKeys<'_>, public_key: &PublicKey, view_key: &SecretKey) -> Derivation {
    keys.device
        .generate_key_derivation(public_key, view_key)
        .unwrap_or_else(|| {
            log::debug!(
                "Cannot derive from public key {}, using the identity",
                hex::encode(public_key.as_bytes())
            );
            Derivation::identity()
        })
}

/// The recovered spend key and index if the output is towards the account
fn match_output(
    keys: &ScanKeys<'_>,
    output_key: &PublicKey,
    derivation: &Derivation,
    output_index: u64,
) -> Option<(PublicKey, Option<SubAddressIndex>)> {
    let spend_public_key = keys
        .device
        .derive_subaddress_public_key(output_key, derivation, output_index)?;

    match keys.primary {
        Some(primary) => primary
            .has_subaddress(&spend_public_key)
            .map(|index| (spend_public_key, Some(index))),
        None if spend_public_key == keys.address.spend_public_key => {
            Some((spend_public_key, keys.subaddress_index))
        }
        None => None,
    }
}

/// Keeps the subaddress window `lookahead.major` majors ahead of the highest index seen
fn maybe_expand(keys: &ScanKeys<'_>, index: SubAddressIndex) -> Result<()> {
    let primary = match keys.primary {
        Some(primary) => primary,
        None => return Ok(()),
    };

    let next = primary.next_major_to_populate();
    let wanted = index.0.saturating_add(primary.lookahead().major);
    if wanted > next {
        let new_majors = (wanted - next).min(MAX_MAJOR_EXPANSION);
        primary.expand_subaddresses(next + new_majors)?;
    }
    Ok(())
}

pub(crate) fn identify_outputs(
    keys: &ScanKeys<'_>,
    tx: &Transaction,
    tx_public_key: &PublicKey,
    additional_public_keys: &[PublicKey],
) -> Result<Vec<OutputInfo>> {
    let view_key = keys.view_key.ok_or(Error::MissingViewKey)?;

    let main_derivation = derive_or_identity(keys, tx_public_key, view_key);
    let additional_derivations: Vec<Derivation> = additional_public_keys
        .iter()
        .map(|public_key| derive_or_identity(keys, public_key, view_key))
        .collect();

    let mut found = Vec::new();
    for (i, output) in tx.prefix.outputs.iter().enumerate() {
        let output_key = match &output.target {
            TXOutTarget::ToKey { key } => key,
            TXOutTarget::ToScriptHash { .. } => continue,
        };
        let index_in_tx = i as u64;

        let matched = match_output(keys, output_key, &main_derivation, index_in_tx)
            .map(|matched| (main_derivation, matched))
            .or_else(|| {
                let derivation = additional_derivations.get(i)?;
                match_output(keys, output_key, derivation, index_in_tx)
                    .map(|matched| (*derivation, matched))
            });
        let (derivation, (subaddress_spend_public_key, subaddress_index)) = match matched {
            Some(matched) => matched,
            None => continue,
        };

        let (amount, rct) = if tx.is_rct() && !tx.is_coinbase() {
            let commitment = keys
                .device
                .decode_ringct(&tx.rct_signatures, &derivation, index_in_tx)
                .map_err(|source| {
                    log::warn!("Cannot decode amount of output {}: {}", index_in_tx, source);
                    Error::RingCT {
                        index: index_in_tx,
                        source,
                    }
                })?;
            // Both exist once decoding succeeded
            let ecdh = &tx.rct_signatures.ecdh_exchange[i];
            let rct = RctOutput {
                commitment: tx.rct_signatures.output_commitments[i],
                ecdh_mask: ecdh.mask,
                ecdh_amount: ecdh.amount,
                mask: commitment.mask,
            };
            (commitment.amount, Some(rct))
        } else {
            (output.amount, None)
        };

        log::debug!(
            "Output {} ({}) is ours, amount {}",
            index_in_tx,
            hex::encode(output_key.as_bytes()),
            amount
        );
        found.push(OutputInfo {
            public_key: *output_key,
            amount,
            index_in_tx,
            derivation,
            rct,
            subaddress_spend_public_key,
            subaddress_index,
        });

        if let Some(index) = subaddress_index {
            maybe_expand(keys, index)?;
        }
    }

    Ok(found)
}
