use serde::{Deserialize, Serialize};

use crypto::{CNFastHash, KeyPair, PublicKey, ScalarExt, SecretKey};

use crate::Address;

#[derive(Clone, Debug, Deserialize, Serialize)]
/// The keys of an account used to recognize (and, with the spend secret key, spend) outputs
pub struct AccountKeys {
    /// Public spend key
    pub spend_public_key: PublicKey,
    /// Secret spend key. Absent for view-only accounts
    pub spend_secret_key: Option<SecretKey>,
    /// View keypair
    pub view_keypair: KeyPair,
}

/// Deterministic keypair generation
///
/// The view secret key is derived by taking the Keccak (non-standard) hash of the spend secret key
impl From<SecretKey> for AccountKeys {
    fn from(spend_secret_key: SecretKey) -> AccountKeys {
        let view_secret_key =
            SecretKey::from_slice(&CNFastHash::digest(spend_secret_key.as_bytes()));

        AccountKeys::from_secret_keys(spend_secret_key, view_secret_key)
    }
}

impl AccountKeys {
    /// Generate an account keypair with distinct view and secret keys
    pub fn from_secret_keys(spend_secret_key: SecretKey, view_secret_key: SecretKey) -> Self {
        let spend_keypair = KeyPair::from(spend_secret_key);
        AccountKeys {
            spend_public_key: spend_keypair.public_key,
            spend_secret_key: Some(spend_keypair.secret_key),
            view_keypair: KeyPair::from(view_secret_key),
        }
    }

    /// Keys of an account whose spend secret key is unknown
    pub fn view_only(spend_public_key: PublicKey, view_secret_key: SecretKey) -> Self {
        AccountKeys {
            spend_public_key,
            spend_secret_key: None,
            view_keypair: KeyPair::from(view_secret_key),
        }
    }

    /// The standard address of these keys
    pub fn address(&self) -> Address {
        Address::standard(self.spend_public_key, self.view_keypair.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_derives_the_view_key_deterministically() {
        // This given set of keys is that of a testnet wallet. As all keys are in public view,
        // DO NOT use this wallet for storing any coins
        let keys = AccountKeys::from(SecretKey::from_slice(
            &hex::decode("91ca5959117826861a8d3dba04ef036aba07ca4e02b9acf28fc1e3af25c4400a")
                .unwrap(),
        ));

        assert_eq!(
            hex::encode(keys.spend_public_key.as_bytes()),
            "4dcff6ae0b5313938e718bb033907fee6cddc053f4d44c41bd0f9fed5ea7cef7"
        );
        assert_eq!(
            hex::encode(keys.view_keypair.secret_key.as_bytes()),
            "84bc8a0314bfa06dee4b992cca4420d19f28af37f4fb90e031454c66f8cd6003"
        );
        assert_eq!(
            hex::encode(keys.view_keypair.public_key.as_bytes()),
            "8b66a0e272063786cc769c295486552e39797c57243612047bff9845c8cc66c8"
        );
    }

    #[test]
    fn view_only_keys_have_no_spend_secret() {
        let full = AccountKeys::from(SecretKey::from(7u64));
        let view_only = AccountKeys::view_only(full.spend_public_key, full.view_keypair.secret_key);

        assert!(view_only.spend_secret_key.is_none());
        assert_eq!(view_only.address(), full.address());
    }
}
