/// Type alias for the Result returned from functions in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Blockchain DB operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a transaction exists in the chain when it shouldn't
    #[error("Object exists in main chain")]
    Exists,

    /// Returned when a transaction does not exist in the chain when it should
    #[error("Object does not exist in main chain")]
    DoesNotExist,

    /// Returned when an output offset is past the end of its amount bucket
    #[error("Output offset {offset} out of range for amount {amount}")]
    OutOfRange { amount: u64, offset: u64 },

    /// Returned when the DB driver faces an internal issue
    #[error(transparent)]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}
