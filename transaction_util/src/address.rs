//! Module for handling addresses

use std::convert::TryInto;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crypto::{
    ecc::{CompressedPoint, PointExt},
    Hash8, PublicKey,
};

/// Varint prefixes used to identify an address from its string representation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AddressPrefixes {
    /// Prefix for a standard address
    pub standard: u64,
    /// Prefix for a subaddress
    pub subaddress: u64,
    /// Prefix for an integrated address
    pub integrated: u64,
}

/// The network an address belongs to
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    /// Main network
    Mainnet,
    /// Test network
    Testnet,
    /// Staging network
    Stagenet,
}

impl NetworkType {
    /// Address prefixes used on this network
    pub fn prefixes(self) -> AddressPrefixes {
        match self {
            NetworkType::Mainnet => AddressPrefixes {
                standard: 18,
                subaddress: 42,
                integrated: 19,
            },
            NetworkType::Testnet => AddressPrefixes {
                standard: 53,
                subaddress: 63,
                integrated: 54,
            },
            NetworkType::Stagenet => AddressPrefixes {
                standard: 24,
                subaddress: 36,
                integrated: 25,
            },
        }
    }

    /// Finds the network a given address string was encoded for
    pub fn detect(address: &str) -> Option<NetworkType> {
        [
            NetworkType::Mainnet,
            NetworkType::Testnet,
            NetworkType::Stagenet,
        ]
        .iter()
        .copied()
        .find(|network| Address::from_address_string(address, &network.prefixes()).is_ok())
    }
}

impl Default for NetworkType {
    fn default() -> Self {
        NetworkType::Stagenet
    }
}

impl Display for NetworkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            NetworkType::Mainnet => 0,
            NetworkType::Testnet => 1,
            NetworkType::Stagenet => 2,
        };
        write!(f, "{}", value)
    }
}

impl std::str::FromStr for NetworkType {
    type Err = Error;
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.to_lowercase().as_str() {
            "mainnet" | "0" => Ok(NetworkType::Mainnet),
            "testnet" | "1" => Ok(NetworkType::Testnet),
            "stagenet" | "2" => Ok(NetworkType::Stagenet),
            _ => Err(Error::UnknownNetwork(data.to_string())),
        }
    }
}

/// Tags for each type of address
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub enum AddressType {
    /// Standard address
    Standard,
    /// Subaddress
    SubAddress,
    /// Integrated address: Standard address with an included payment ID
    Integrated(Hash8),
}

impl Default for AddressType {
    fn default() -> Self {
        AddressType::Standard
    }
}

/// Wrapper for the set of public keys in an address
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Type of address
    pub address_type: AddressType,
    /// Public spend key
    pub spend_public_key: PublicKey,
    /// Public view key
    pub view_public_key: PublicKey,
}

/// Error type for Address operations
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the address cannot be decoded correctly
    #[error("Invalid address encoding")]
    InvalidEncoding(#[from] base58_monero::Error),

    /// Returned when the address prefix is invalid
    #[error("Invalid address prefix")]
    InvalidPrefix,

    /// Returned when the decoded address has the wrong size for its type
    #[error("Invalid address length")]
    InvalidLength,

    /// Returned when a public key in the address is not a point on the curve
    #[error("Invalid public key in address")]
    InvalidKey,

    /// Returned when a network name cannot be recognized
    #[error("Unknown network {0}")]
    UnknownNetwork(String),
}

impl Address {
    /// Generate the standard address from the given public keys
    pub fn standard(spend_public_key: PublicKey, view_public_key: PublicKey) -> Self {
        Address {
            address_type: AddressType::Standard,
            spend_public_key,
            view_public_key,
        }
    }

    /// Generate a subaddress from the given public keys
    pub fn subaddress(spend_public_key: PublicKey, view_public_key: PublicKey) -> Self {
        Address {
            address_type: AddressType::SubAddress,
            spend_public_key,
            view_public_key,
        }
    }

    /// Generate an integrated address from the given public keys and payment ID
    pub fn integrated(
        spend_public_key: PublicKey,
        view_public_key: PublicKey,
        payment_id: Hash8,
    ) -> Self {
        Address {
            address_type: AddressType::Integrated(payment_id),
            spend_public_key,
            view_public_key,
        }
    }

    /// Whether this address is a subaddress
    pub fn is_subaddress(&self) -> bool {
        self.address_type == AddressType::SubAddress
    }

    /// The payment ID carried by an integrated address
    pub fn payment_id(&self) -> Option<Hash8> {
        match self.address_type {
            AddressType::Integrated(payment_id) => Some(payment_id),
            _ => None,
        }
    }

    /// Whether both public keys are points on the curve
    pub fn has_valid_keys(&self) -> bool {
        self.spend_public_key.is_valid_point() && self.view_public_key.is_valid_point()
    }

    /// Converts a human readable Cryptonote address into an Address
    pub fn from_address_string(data: &str, prefixes: &AddressPrefixes) -> Result<Self, Error> {
        let data = base58_monero::decode_check(data)?;

        let (tag, tag_end) = varint::deserialize(&data).ok_or(Error::InvalidPrefix)?;
        let body = &data[tag_end..];

        let key_at = |offset: usize| -> Result<PublicKey, Error> {
            let bytes: [u8; 32] = body
                .get(offset..offset + 32)
                .ok_or(Error::InvalidLength)?
                .try_into()
                .map_err(|_| Error::InvalidLength)?;
            Ok(CompressedPoint(bytes))
        };

        let address = if tag == prefixes.standard || tag == prefixes.subaddress {
            if body.len() != 64 {
                return Err(Error::InvalidLength);
            }
            if tag == prefixes.standard {
                Address::standard(key_at(0)?, key_at(32)?)
            } else {
                Address::subaddress(key_at(0)?, key_at(32)?)
            }
        } else if tag == prefixes.integrated {
            if body.len() != 72 {
                return Err(Error::InvalidLength);
            }
            let payment_id: [u8; 8] = body[64..72]
                .try_into()
                .map_err(|_| Error::InvalidLength)?;
            Address::integrated(key_at(0)?, key_at(32)?, Hash8::from(payment_id))
        } else {
            return Err(Error::InvalidPrefix);
        };

        if !address.has_valid_keys() {
            return Err(Error::InvalidKey);
        }

        Ok(address)
    }

    /// Converts an Address to a human readable Cryptonote address
    pub fn to_address_string(&self, prefixes: &AddressPrefixes) -> Result<String, Error> {
        let mut address = Vec::new();

        // Tag
        let tag = match &self.address_type {
            AddressType::Standard => prefixes.standard,
            AddressType::SubAddress => prefixes.subaddress,
            AddressType::Integrated(_) => prefixes.integrated,
        };
        address.extend_from_slice(&varint::serialize(tag));

        // Spend public key
        address.extend_from_slice(self.spend_public_key.as_bytes());

        // View public key
        address.extend_from_slice(self.view_public_key.as_bytes());

        // Payment ID
        if let AddressType::Integrated(payment_id) = &self.address_type {
            address.extend_from_slice(payment_id.data());
        }

        // Base58
        Ok(base58_monero::encode_check(&address)?)
    }
}
