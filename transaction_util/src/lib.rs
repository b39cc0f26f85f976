#![deny(missing_docs)]
//! Utilities for recognizing transactions: addresses, key derivations, subaddresses,
//! payment ID encryption and key images

mod account_keys;
pub mod address;
mod derivation;
pub mod device;
pub mod payment_id;
pub mod subaddress;
#[cfg(test)]
mod test_definitions;
pub mod tx_scanning;

pub use account_keys::AccountKeys;
pub use address::{Address, AddressPrefixes, AddressType, NetworkType};
pub use derivation::Derivation;
pub use device::{default_device, DefaultDevice, Device};
pub use subaddress::SubAddressIndex;
