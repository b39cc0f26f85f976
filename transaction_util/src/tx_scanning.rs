//! Module for scanning transactions

use ensure_macro::ensure;

use crypto::{
    ecc::{self, Point},
    KeyImage, KeyPair, PublicKey, SecretKey,
};

use crate::{
    account_keys::AccountKeys,
    derivation::Derivation,
    device::{Error, Result},
    subaddress::{self, SubAddressIndex},
};

/// Recovers the subaddress spend public key an output was sent to
///
/// P - H_s(derivation || output_index)G. Equals the account's (sub)address spend key if the
/// output is towards it
pub fn derive_subaddress_public_key(
    output_key: &PublicKey,
    derivation: &Derivation,
    output_index: u64,
) -> Option<PublicKey> {
    let output_key: Point = output_key.decompress()?;
    Some((output_key - derivation.to_point(output_index)).compress())
}

/// H_s(derivation || output_index)G + B
pub fn derive_public_key(
    derivation: &Derivation,
    output_index: u64,
    base: &PublicKey,
) -> Option<PublicKey> {
    Some((derivation.to_point(output_index) + base.decompress()?).compress())
}

/// H_s(derivation || output_index) + b
pub fn derive_secret_key(derivation: &Derivation, output_index: u64, base: &SecretKey) -> SecretKey {
    derivation.to_scalar(output_index) + base
}

/// x * H_p(P)
pub fn key_image(public_key: &PublicKey, secret_key: &SecretKey) -> KeyImage {
    (secret_key * ecc::hash_to_point(public_key)).compress()
}

/// Generates the key image of an output sent to the primary address owning `public_key`
pub fn generate_key_image(
    derivation: &Derivation,
    output_index: u64,
    secret_key: &SecretKey,
    public_key: &PublicKey,
) -> Result<KeyImage> {
    let ephemeral_public_key = derive_public_key(derivation, output_index, public_key)
        .ok_or_else(|| Error::InvalidPublicKey(hex::encode(public_key.as_bytes())))?;
    let ephemeral_secret_key = derive_secret_key(derivation, output_index, secret_key);

    Ok(key_image(&ephemeral_public_key, &ephemeral_secret_key))
}

/// Computes the one-time keypair and key image needed for spending the given output
///
/// The output secret key is H_s(aR || idx) + b, plus the subaddress secret key m when the
/// output was sent to a subaddress. Fails if the account cannot spend or the derived public
/// key does not equal the output key.
pub fn generate_key_image_subaddress_aware(
    account_keys: &AccountKeys,
    output_public_key: &PublicKey,
    derivation: &Derivation,
    output_index: u64,
    subaddress_index: &SubAddressIndex,
) -> Result<(KeyPair, KeyImage)> {
    let spend_secret_key = account_keys
        .spend_secret_key
        .ok_or(Error::MissingSpendKey)?;

    let mut output_secret_key = derive_secret_key(derivation, output_index, &spend_secret_key);
    if !subaddress_index.is_zero() {
        // Subaddresses require an extra addition for the subaddress secret key
        // H_s(aR) + b + m_i
        output_secret_key += subaddress::get_subaddress_secret_key(
            &account_keys.view_keypair.secret_key,
            subaddress_index,
        );
    }

    let ephemeral = KeyPair::from(output_secret_key);
    ensure!(
        &ephemeral.public_key == output_public_key,
        Error::KeyMismatch(hex::encode(output_public_key.as_bytes()))
    );

    let key_image = key_image(&ephemeral.public_key, &ephemeral.secret_key);
    Ok((ephemeral, key_image))
}
