//! The set of cryptographic operations needed to recognize transactions
//!
//! Everything that touches secret keys goes through a [`Device`], so that hardware
//! wallets can stand in for the software implementation.

use thiserror::Error;

use crypto::{Hash8, KeyImage, KeyPair, PublicKey, SecretKey};
use ringct::{Commitment, RingCTBase};

use crate::{
    payment_id, subaddress, tx_scanning, AccountKeys, Address, Derivation, SubAddressIndex,
};

/// Type alias for the Result returned from device operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for device operations
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a key that should be a curve point is not
    #[error("Invalid public key {0}")]
    InvalidPublicKey(String),

    /// Returned when a regenerated output key does not match the output
    #[error("Derived key does not match output key {0}")]
    KeyMismatch(String),

    /// Returned when spending keys are required but only viewing keys are known
    #[error("Spend secret key is unavailable")]
    MissingSpendKey,

    /// Returned when a RingCT amount cannot be recovered
    #[error(transparent)]
    RingCT(#[from] ringct::Error),
}

/// Cryptographic primitives used while scanning transactions
pub trait Device: Send + Sync {
    /// 8 * secret_key * public_key, `None` if the public key is not a curve point
    fn generate_key_derivation(
        &self,
        public_key: &PublicKey,
        secret_key: &SecretKey,
    ) -> Option<Derivation>;

    /// P - H_s(derivation || output_index)G
    fn derive_subaddress_public_key(
        &self,
        output_key: &PublicKey,
        derivation: &Derivation,
        output_index: u64,
    ) -> Option<PublicKey>;

    /// H_s(derivation || output_index)G + B
    fn derive_public_key(
        &self,
        derivation: &Derivation,
        output_index: u64,
        base: &PublicKey,
    ) -> Option<PublicKey>;

    /// H_s(derivation || output_index) + b
    fn derive_secret_key(
        &self,
        derivation: &Derivation,
        output_index: u64,
        base: &SecretKey,
    ) -> SecretKey;

    /// Key image of an output sent to the address with the given spend keys
    fn generate_key_image(
        &self,
        derivation: &Derivation,
        output_index: u64,
        secret_key: &SecretKey,
        public_key: &PublicKey,
    ) -> Result<KeyImage>;

    /// Key image of an output sent to any subaddress of the given account
    fn generate_key_image_subaddress_aware(
        &self,
        account_keys: &AccountKeys,
        output_public_key: &PublicKey,
        derivation: &Derivation,
        output_index: u64,
        subaddress_index: &SubAddressIndex,
    ) -> Result<(KeyPair, KeyImage)>;

    /// Recovers the amount and mask of a RingCT output
    fn decode_ringct(
        &self,
        signature: &RingCTBase,
        derivation: &Derivation,
        output_index: u64,
    ) -> Result<Commitment>;

    /// XORs an 8 byte payment ID with a hash of the derivation of the given keys.
    /// `None` if no derivation can be made
    fn encrypt_payment_id(
        &self,
        payment_id: Hash8,
        public_key: &PublicKey,
        secret_key: &SecretKey,
    ) -> Option<Hash8>;

    /// m = H_s("SubAddr" || a || major || minor)
    fn get_subaddress_secret_key(
        &self,
        view_secret_key: &SecretKey,
        index: &SubAddressIndex,
    ) -> SecretKey;

    /// Public spend key of the subaddress at `index`
    fn get_subaddress_spend_public_key(
        &self,
        account_keys: &AccountKeys,
        index: &SubAddressIndex,
    ) -> Option<PublicKey>;

    /// Public spend keys of the minor indices `[begin, end)` of a major index
    fn get_subaddress_spend_public_keys(
        &self,
        account_keys: &AccountKeys,
        major: u32,
        begin: u32,
        end: u32,
    ) -> Option<Vec<PublicKey>>;

    /// Full address of the subaddress at `index`
    fn get_subaddress(&self, account_keys: &AccountKeys, index: &SubAddressIndex)
        -> Option<Address>;
}

/// Software implementation of [`Device`]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDevice;

static DEFAULT_DEVICE: DefaultDevice = DefaultDevice;

/// The software device
pub fn default_device() -> &'static dyn Device {
    &DEFAULT_DEVICE
}

impl Device for DefaultDevice {
    fn generate_key_derivation(
        &self,
        public_key: &PublicKey,
        secret_key: &SecretKey,
    ) -> Option<Derivation> {
        Derivation::from(secret_key, public_key)
    }

    fn derive_subaddress_public_key(
        &self,
        output_key: &PublicKey,
        derivation: &Derivation,
        output_index: u64,
    ) -> Option<PublicKey> {
        tx_scanning::derive_subaddress_public_key(output_key, derivation, output_index)
    }

    fn derive_public_key(
        &self,
        derivation: &Derivation,
        output_index: u64,
        base: &PublicKey,
    ) -> Option<PublicKey> {
        tx_scanning::derive_public_key(derivation, output_index, base)
    }

    fn derive_secret_key(
        &self,
        derivation: &Derivation,
        output_index: u64,
        base: &SecretKey,
    ) -> SecretKey {
        tx_scanning::derive_secret_key(derivation, output_index, base)
    }

    fn generate_key_image(
        &self,
        derivation: &Derivation,
        output_index: u64,
        secret_key: &SecretKey,
        public_key: &PublicKey,
    ) -> Result<KeyImage> {
        tx_scanning::generate_key_image(derivation, output_index, secret_key, public_key)
    }

    fn generate_key_image_subaddress_aware(
        &self,
        account_keys: &AccountKeys,
        output_public_key: &PublicKey,
        derivation: &Derivation,
        output_index: u64,
        subaddress_index: &SubAddressIndex,
    ) -> Result<(KeyPair, KeyImage)> {
        tx_scanning::generate_key_image_subaddress_aware(
            account_keys,
            output_public_key,
            derivation,
            output_index,
            subaddress_index,
        )
    }

    fn decode_ringct(
        &self,
        signature: &RingCTBase,
        derivation: &Derivation,
        output_index: u64,
    ) -> Result<Commitment> {
        let shared_secret = derivation.to_scalar(output_index);
        Ok(ringct::decode(
            signature,
            output_index as usize,
            &shared_secret,
        )?)
    }

    fn encrypt_payment_id(
        &self,
        payment_id: Hash8,
        public_key: &PublicKey,
        secret_key: &SecretKey,
    ) -> Option<Hash8> {
        let derivation = Derivation::from(secret_key, public_key)?;
        Some(payment_id::encrypt(payment_id, &derivation))
    }

    fn get_subaddress_secret_key(
        &self,
        view_secret_key: &SecretKey,
        index: &SubAddressIndex,
    ) -> SecretKey {
        subaddress::get_subaddress_secret_key(view_secret_key, index)
    }

    fn get_subaddress_spend_public_key(
        &self,
        account_keys: &AccountKeys,
        index: &SubAddressIndex,
    ) -> Option<PublicKey> {
        subaddress::get_subaddress_spend_public_key(account_keys, index)
    }

    fn get_subaddress_spend_public_keys(
        &self,
        account_keys: &AccountKeys,
        major: u32,
        begin: u32,
        end: u32,
    ) -> Option<Vec<PublicKey>> {
        subaddress::get_subaddress_spend_public_keys(account_keys, major, begin, end)
    }

    fn get_subaddress(
        &self,
        account_keys: &AccountKeys,
        index: &SubAddressIndex,
    ) -> Option<Address> {
        subaddress::get_address_for_index(account_keys, index)
    }
}
