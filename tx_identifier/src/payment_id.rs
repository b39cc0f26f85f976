use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::{ExtraNonce, Transaction};
use crypto::{Hash256, Hash8, PublicKey, SecretKey};
use transaction_util::Device;

use crate::{Error, Identified, Identifier, IdentifierKind, Result, ScanKeys};

/// A payment ID found in a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FoundPaymentId {
    /// 32 byte plaintext payment ID
    Legacy(Hash256),
    /// 8 byte payment ID of an integrated address, decrypted
    Integrated(Hash8),
}

impl Display for FoundPaymentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FoundPaymentId::Legacy(payment_id) => write!(f, "{}", payment_id),
            FoundPaymentId::Integrated(payment_id) => write!(f, "{}", payment_id),
        }
    }
}

/// The two forms a payment ID can take inside a transaction nonce
pub trait PaymentIdFormat: Copy + PartialEq {
    const KIND: IdentifierKind;
    /// Whether the form is encrypted towards the recipient's view key
    const ENCRYPTED: bool;

    fn from_nonce(nonce: &ExtraNonce) -> Option<Self>;
    fn is_null(&self) -> bool;
    fn decrypt(
        self,
        device: &dyn Device,
        tx_public_key: &PublicKey,
        view_key: &SecretKey,
    ) -> Result<Self>;
    fn wrap(self) -> FoundPaymentId;
}

impl PaymentIdFormat for Hash256 {
    const KIND: IdentifierKind = IdentifierKind::LegacyPaymentId;
    const ENCRYPTED: bool = false;

    fn from_nonce(nonce: &ExtraNonce) -> Option<Self> {
        match nonce {
            ExtraNonce::PaymentId(payment_id) => Some(*payment_id),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        Hash256::is_null(self)
    }

    fn decrypt(self, _: &dyn Device, _: &PublicKey, _: &SecretKey) -> Result<Self> {
        Ok(self)
    }

    fn wrap(self) -> FoundPaymentId {
        FoundPaymentId::Legacy(self)
    }
}

impl PaymentIdFormat for Hash8 {
    const KIND: IdentifierKind = IdentifierKind::IntegratedPaymentId;
    const ENCRYPTED: bool = true;

    fn from_nonce(nonce: &ExtraNonce) -> Option<Self> {
        match nonce {
            ExtraNonce::EncryptedPaymentId(payment_id) => Some(*payment_id),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        Hash8::is_null(self)
    }

    fn decrypt(
        self,
        device: &dyn Device,
        tx_public_key: &PublicKey,
        view_key: &SecretKey,
    ) -> Result<Self> {
        // Encryption is its own inverse
        device
            .encrypt_payment_id(self, tx_public_key, view_key)
            .ok_or(Error::PaymentIdDecryption(self))
    }

    fn wrap(self) -> FoundPaymentId {
        FoundPaymentId::Integrated(self)
    }
}

/// Reads the payment ID of a transaction
///
/// A null payment ID is reported as none. Encrypted payment IDs need the view key and are
/// reported as none without it.
pub struct PaymentId<'a, T: PaymentIdFormat> {
    view_key: Option<&'a SecretKey>,
    device: &'a dyn Device,
    raw: Option<T>,
    payment_id: Option<T>,
}

pub type LegacyPaymentId<'a> = PaymentId<'a, Hash256>;
pub type IntegratedPaymentId<'a> = PaymentId<'a, Hash8>;

impl<'a, T: PaymentIdFormat> PaymentId<'a, T> {
    pub fn new(keys: &ScanKeys<'a>) -> Self {
        PaymentId {
            view_key: keys.view_key,
            device: keys.device,
            raw: None,
            payment_id: None,
        }
    }

    /// The payment ID found by the last identification
    pub fn get(&self) -> Option<T> {
        self.payment_id
    }

    /// The payment ID as stored in the transaction, still encrypted for the 8 byte form
    pub fn raw(&self) -> Option<T> {
        self.raw
    }
}

impl<'a, T: PaymentIdFormat> Identifier for PaymentId<'a, T> {
    fn kind(&self) -> IdentifierKind {
        T::KIND
    }

    fn identify(
        &mut self,
        tx: &Transaction,
        tx_public_key: &PublicKey,
        _: &[PublicKey],
    ) -> Result<()> {
        self.raw = tx
            .extra_nonce()
            .and_then(|nonce| T::from_nonce(&nonce));
        self.payment_id = None;

        let raw = match self.raw {
            Some(raw) if !raw.is_null() => raw,
            _ => return Ok(()),
        };
        let payment_id = match self.view_key {
            Some(view_key) => raw.decrypt(self.device, tx_public_key, view_key)?,
            None if T::ENCRYPTED => return Ok(()),
            None => raw,
        };

        if !payment_id.is_null() {
            self.payment_id = Some(payment_id);
        }
        Ok(())
    }

    fn identified(&self) -> Identified<'_> {
        Identified::PaymentId(self.payment_id.map(T::wrap))
    }

    fn total(&self) -> u64 {
        0
    }
}
