use crypto::{Hash256, Hash8};
use transaction_util::{address, device};

/// Type alias for the Result returned from identification
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading account material
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Cannot parse address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: address::Error,
    },

    #[error("Cannot parse secret key {0}")]
    SecretKey(String),

    #[error("Address contains a public key that is not on the curve")]
    PublicKey,
}

/// Error type for identification
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Account has no address")]
    MissingAddress,

    #[error("A view key is required")]
    MissingViewKey,

    #[error("A spend key is required")]
    MissingSpendKey,

    #[error("A primary account is required")]
    NotPrimary,

    /// A matched output whose amount cannot be recovered
    #[error("Cannot decode RingCT output {index}: {source}")]
    RingCT {
        index: u64,
        #[source]
        source: device::Error,
    },

    /// A ring member refers to a transaction the store does not know about
    #[error("Transaction <{0}> not found")]
    TransactionNotFound(Hash256),

    #[error(transparent)]
    DB(#[from] blockchain_db::Error),

    #[error("Cannot generate key image: {0}")]
    KeyImage(#[source] device::Error),

    #[error("Cannot decrypt payment ID {0}")]
    PaymentIdDecryption(Hash8),
}
