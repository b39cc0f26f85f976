//! Transaction model shared across the workspace

mod extra;
mod traits;
mod transaction;

pub use extra::{
    additional_public_keys_from_extra, extra_nonce_from_extra, parse_extra, serialize_extra,
    tx_public_key_from_extra, ExtraNonce, TXExtra,
};
pub use traits::GetHash;
pub use transaction::{
    relative_output_offsets_to_absolute, TXIn, TXOut, TXOutTarget, Transaction,
    TransactionPrefix,
};
