use common::Transaction;
use crypto::{PublicKey, SecretKey};
use transaction_util::{default_device, Address, Device, SubAddressIndex};

use crate::{
    Account, AnyAccount, Error, FoundPaymentId, InputInfo, OutputInfo, PrimaryAccount, Result,
    SubaddressAccount,
};

/// Kinds of identifiers, used to look them up inside a [`crate::ModularIdentifier`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Output,
    Input,
    GuessInput,
    RealInput,
    LegacyPaymentId,
    IntegratedPaymentId,
}

/// What an identifier found in the last transaction it was run on
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Identified<'r> {
    Outputs(&'r [OutputInfo]),
    Inputs(&'r [InputInfo]),
    PaymentId(Option<FoundPaymentId>),
}

/// Something that inspects a transaction on behalf of an account
pub trait Identifier {
    fn kind(&self) -> IdentifierKind;

    /// Scans `tx`. Public keys are read from the extra field once by the caller and shared
    /// between identifiers
    ///
    /// Results of a previous call are replaced.
    fn identify(
        &mut self,
        tx: &Transaction,
        tx_public_key: &PublicKey,
        additional_public_keys: &[PublicKey],
    ) -> Result<()>;

    fn identified(&self) -> Identified<'_>;

    /// Sum of the amounts identified, 0 for payment IDs
    fn total(&self) -> u64;
}

/// Key material an identifier scans with
///
/// Subaddress awareness comes from `primary`: with it, outputs are matched against the
/// account's subaddress map, without it only against the address's own spend key.
#[derive(Clone, Copy)]
pub struct ScanKeys<'a> {
    pub address: &'a Address,
    pub view_key: Option<&'a SecretKey>,
    pub spend_key: Option<&'a SecretKey>,
    pub primary: Option<&'a PrimaryAccount>,
    /// Index of the address when it is a subaddress of known position
    pub subaddress_index: Option<SubAddressIndex>,
    pub device: &'a dyn Device,
}

impl<'a> ScanKeys<'a> {
    /// Bare keys, matching outputs against the address's spend key only
    pub fn new(address: &'a Address, view_key: &'a SecretKey) -> Self {
        ScanKeys {
            address,
            view_key: Some(view_key),
            spend_key: None,
            primary: None,
            subaddress_index: None,
            device: default_device(),
        }
    }

    pub fn with_spend_key(mut self, spend_key: &'a SecretKey) -> Self {
        self.spend_key = Some(spend_key);
        self
    }

    pub fn with_device(mut self, device: &'a dyn Device) -> Self {
        self.device = device;
        self
    }

    /// Keys of any account with an address, without subaddress awareness
    pub fn from_account(account: &'a Account) -> Result<Self> {
        let address = account.address().ok_or(Error::MissingAddress)?;
        Ok(ScanKeys {
            address,
            view_key: account.view_key(),
            spend_key: account.spend_key(),
            primary: None,
            subaddress_index: None,
            device: default_device(),
        })
    }

    /// Keys of a primary account, matching outputs against all of its subaddresses
    pub fn from_primary(primary: &'a PrimaryAccount) -> Result<Self> {
        Ok(ScanKeys {
            primary: Some(primary),
            ..ScanKeys::from_account(primary.account())?
        })
    }

    pub fn from_subaddress(subaddress: &'a SubaddressAccount) -> Result<Self> {
        Ok(ScanKeys {
            subaddress_index: subaddress.index(),
            ..ScanKeys::from_account(subaddress.account())?
        })
    }

    pub fn from_any(account: &'a AnyAccount) -> Result<Self> {
        match account {
            AnyAccount::Primary(primary) => ScanKeys::from_primary(primary),
            AnyAccount::Subaddress(subaddress) => ScanKeys::from_subaddress(subaddress),
        }
    }

    pub fn is_subaddress_aware(&self) -> bool {
        self.primary.is_some()
    }
}
