use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ensure_macro::ensure;

use crypto::{keys::parse_secret_key, KeyPair, PublicKey, SecretKey};
use transaction_util::{default_device, AccountKeys, Address, NetworkType, SubAddressIndex};

use crate::{Error, Lookahead, ParseError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountType {
    /// No address, hence no keys
    None,
    Primary,
    Subaddress,
}

/// An address along with whatever secret keys are known for it
#[derive(Clone, Debug, Default)]
pub struct Account {
    network: NetworkType,
    address: Option<Address>,
    view_key: Option<SecretKey>,
    spend_key: Option<SecretKey>,
}

impl Account {
    /// Creates an account from a parsed address
    ///
    /// Fails if either public key of the address is not on the curve
    pub fn new(
        network: NetworkType,
        address: Address,
        view_key: Option<SecretKey>,
        spend_key: Option<SecretKey>,
    ) -> std::result::Result<Self, ParseError> {
        ensure!(address.has_valid_keys(), ParseError::PublicKey);
        Ok(Account {
            network,
            address: Some(address),
            view_key,
            spend_key,
        })
    }

    /// Creates an account from its string forms. Empty key strings mean the key is unknown
    pub fn from_strings(
        network: NetworkType,
        address: &str,
        view_key: &str,
        spend_key: &str,
    ) -> std::result::Result<Self, ParseError> {
        let parsed = Address::from_address_string(address, &network.prefixes()).map_err(
            |source| ParseError::Address {
                address: address.to_string(),
                source,
            },
        )?;
        let parse_key = |key: &str| -> std::result::Result<Option<SecretKey>, ParseError> {
            if key.is_empty() {
                return Ok(None);
            }
            parse_secret_key(key)
                .map(Some)
                .ok_or_else(|| ParseError::SecretKey(key.to_string()))
        };

        Account::new(network, parsed, parse_key(view_key)?, parse_key(spend_key)?)
    }

    pub fn account_type(&self) -> AccountType {
        match &self.address {
            None => AccountType::None,
            Some(address) if address.is_subaddress() => AccountType::Subaddress,
            Some(_) => AccountType::Primary,
        }
    }

    pub fn is_none(&self) -> bool {
        self.account_type() == AccountType::None
    }

    pub fn is_primary(&self) -> bool {
        self.account_type() == AccountType::Primary
    }

    pub fn is_subaddress(&self) -> bool {
        self.account_type() == AccountType::Subaddress
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn view_key(&self) -> Option<&SecretKey> {
        self.view_key.as_ref()
    }

    pub fn spend_key(&self) -> Option<&SecretKey> {
        self.spend_key.as_ref()
    }

    /// The address encoded for this account's network, empty when there is none
    pub fn address_string(&self) -> String {
        self.address
            .as_ref()
            .and_then(|address| address.to_address_string(&self.network.prefixes()).ok())
            .unwrap_or_default()
    }

    pub fn view_key_string(&self) -> String {
        self.view_key
            .map(|key| hex::encode(key.as_bytes()))
            .unwrap_or_default()
    }

    pub fn spend_key_string(&self) -> String {
        self.spend_key
            .map(|key| hex::encode(key.as_bytes()))
            .unwrap_or_default()
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nt:{},a:{},v:{},s:{}",
            self.network,
            self.address_string(),
            self.view_key_string(),
            self.spend_key_string()
        )
    }
}

struct SubaddressMap {
    map: HashMap<PublicKey, SubAddressIndex>,
    next_major_to_populate: u32,
}

/// The canonical account of a wallet, able to recognize outputs sent to any of its
/// subaddresses
///
/// Subaddress spend keys are kept in a map that grows as higher indices are seen. The map
/// is behind a lock so that a shared account can be scanned from several threads.
pub struct PrimaryAccount {
    account: Account,
    keys: OnceLock<Option<AccountKeys>>,
    subaddresses: RwLock<SubaddressMap>,
    lookahead: Lookahead,
}

impl PrimaryAccount {
    /// Wraps a primary account with the default lookahead. Fails for subaddresses and
    /// accounts without an address
    pub fn new(account: Account) -> Result<Self> {
        PrimaryAccount::with_lookahead(account, Lookahead::default())
    }

    pub fn with_lookahead(account: Account, lookahead: Lookahead) -> Result<Self> {
        ensure!(account.is_primary(), Error::NotPrimary);
        let spend_public_key = account
            .address()
            .map(|address| address.spend_public_key)
            .ok_or(Error::MissingAddress)?;

        let mut map = HashMap::new();
        map.insert(spend_public_key, SubAddressIndex::PRIMARY);

        Ok(PrimaryAccount {
            account,
            keys: OnceLock::new(),
            subaddresses: RwLock::new(SubaddressMap {
                map,
                next_major_to_populate: 0,
            }),
            lookahead,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn lookahead(&self) -> Lookahead {
        self.lookahead
    }

    /// The account's keys, derived on first use. `None` without a view key
    pub fn keys(&self) -> Option<&AccountKeys> {
        self.keys
            .get_or_init(|| {
                let address = self.account.address()?;
                let view_key = *self.account.view_key()?;
                Some(AccountKeys {
                    spend_public_key: address.spend_public_key,
                    spend_secret_key: self.account.spend_key().copied(),
                    view_keypair: KeyPair::from(view_key),
                })
            })
            .as_ref()
    }

    fn read_map(&self) -> RwLockReadGuard<'_, SubaddressMap> {
        self.subaddresses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, SubaddressMap> {
        self.subaddresses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The subaddress account at `index`. `None` without a view key or for index (0, 0)
    pub fn generate_subaddress(&self, index: SubAddressIndex) -> Option<SubaddressAccount> {
        if index.is_zero() {
            return None;
        }
        let keys = self.keys()?;
        let address = default_device().get_subaddress(keys, &index)?;

        Some(SubaddressAccount {
            account: Account {
                network: self.account.network,
                address: Some(address),
                view_key: self.account.view_key,
                spend_key: self.account.spend_key,
            },
            index: Some(index),
        })
    }

    /// Registers a single subaddress index
    ///
    /// # Returns
    /// The spend public key of that subaddress
    pub fn add_subaddress_index(&self, index: SubAddressIndex) -> Result<PublicKey> {
        let keys = self.keys().ok_or(Error::MissingViewKey)?;
        let spend_public_key = default_device()
            .get_subaddress_spend_public_key(keys, &index)
            .ok_or(Error::Parse(ParseError::PublicKey))?;

        self.write_map().map.insert(spend_public_key, index);
        Ok(spend_public_key)
    }

    /// Registers every minor index of the major indices `[start_major, end_major)`
    ///
    /// Minor index 0 of major index 0 is the primary address, which is always registered.
    /// Entries are never removed and the watermark never moves back. A range starting above
    /// the watermark leaves it in place.
    pub fn populate_subaddress_indices(&self, start_major: u32, end_major: u32) -> Result<()> {
        let mut map = self.write_map();
        self.populate_locked(&mut map, start_major, end_major)
    }

    fn populate_locked(
        &self,
        map: &mut SubaddressMap,
        start_major: u32,
        end_major: u32,
    ) -> Result<()> {
        let keys = self.keys().ok_or(Error::MissingViewKey)?;
        let device = default_device();

        for major in start_major..end_major {
            let first_minor = if major == 0 { 1 } else { 0 };
            let spend_public_keys = device
                .get_subaddress_spend_public_keys(keys, major, first_minor, self.lookahead.minor)
                .ok_or(Error::Parse(ParseError::PublicKey))?;

            for (minor, spend_public_key) in (first_minor..).zip(spend_public_keys) {
                map.map
                    .insert(spend_public_key, SubAddressIndex(major, minor));
            }
        }

        // Every major below the watermark is populated
        if start_major <= map.next_major_to_populate {
            map.next_major_to_populate = map.next_major_to_populate.max(end_major);
        }
        Ok(())
    }

    /// Populates the major indices from the current watermark up to `new_major`
    pub fn expand_subaddresses(&self, new_major: u32) -> Result<()> {
        let mut map = self.write_map();
        let start = map.next_major_to_populate;
        if new_major <= start {
            return Ok(());
        }

        log::info!(
            "Expanding subaddresses of major indices {} to {}",
            start,
            new_major
        );
        self.populate_locked(&mut map, start, new_major)
    }

    /// The index of the subaddress with the given spend public key, if registered
    pub fn has_subaddress(&self, spend_public_key: &PublicKey) -> Option<SubAddressIndex> {
        self.read_map().map.get(spend_public_key).copied()
    }

    pub fn next_major_to_populate(&self) -> u32 {
        self.read_map().next_major_to_populate
    }

    /// Number of registered subaddresses, the primary address included
    pub fn subaddress_count(&self) -> usize {
        self.read_map().map.len()
    }
}

impl Deref for PrimaryAccount {
    type Target = Account;
    fn deref(&self) -> &Account {
        &self.account
    }
}

/// A receiving identity derived from a primary account
#[derive(Clone, Debug)]
pub struct SubaddressAccount {
    account: Account,
    index: Option<SubAddressIndex>,
}

impl SubaddressAccount {
    /// Wraps a subaddress account. Fails for primary accounts and accounts without an
    /// address
    pub fn new(account: Account, index: Option<SubAddressIndex>) -> Result<Self> {
        match account.account_type() {
            AccountType::Subaddress => Ok(SubaddressAccount { account, index }),
            AccountType::Primary => Err(Error::NotPrimary),
            AccountType::None => Err(Error::MissingAddress),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// The (major, minor) index, known only when derived from the primary account
    pub fn index(&self) -> Option<SubAddressIndex> {
        self.index
    }
}

impl Deref for SubaddressAccount {
    type Target = Account;
    fn deref(&self) -> &Account {
        &self.account
    }
}

/// Either kind of account with an address
pub enum AnyAccount {
    Primary(PrimaryAccount),
    Subaddress(SubaddressAccount),
}

impl AnyAccount {
    pub fn account(&self) -> &Account {
        match self {
            AnyAccount::Primary(primary) => primary.account(),
            AnyAccount::Subaddress(subaddress) => subaddress.account(),
        }
    }
}

/// Creates a primary or subaddress account depending on the address
pub fn make_account(
    network: NetworkType,
    address: &str,
    view_key: &str,
    spend_key: &str,
) -> Result<AnyAccount> {
    let account = Account::from_strings(network, address, view_key, spend_key)?;
    if account.is_subaddress() {
        Ok(AnyAccount::Subaddress(SubaddressAccount::new(account, None)?))
    } else {
        Ok(AnyAccount::Primary(PrimaryAccount::new(account)?))
    }
}

/// Creates a primary account, refusing subaddresses
pub fn make_primary_account(
    network: NetworkType,
    address: &str,
    view_key: &str,
    spend_key: &str,
) -> Result<PrimaryAccount> {
    match make_account(network, address, view_key, spend_key)? {
        AnyAccount::Primary(primary) => Ok(primary),
        AnyAccount::Subaddress(_) => Err(Error::NotPrimary),
    }
}
