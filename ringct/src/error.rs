/// Type alias for RingCT operations that may result in an error
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for RingCT operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned for signature types that carry no decodable amounts, or unknown type tags
    #[error("Unsupported RingCT type {0}")]
    UnsupportedType(u8),

    /// Returned when the ECDH exchange has no entry for an output
    #[error("No ECDH information for output {0}")]
    MissingEcdhInfo(usize),

    /// Returned when there is no output commitment for an output
    #[error("No commitment for output {0}")]
    MissingCommitment(usize),

    /// Returned when the decoded amount and mask do not open the output commitment
    #[error("Decoded amount of output {0} does not match its commitment")]
    CommitmentMismatch(usize),
}
