//! Read access to confirmed transactions and the global output index

use serde::{Deserialize, Serialize};

use common::Transaction;
use crypto::{Hash256, PublicKey};

mod error;
mod mem;

pub use error::{Error, Result};
pub use mem::BlockchainMemDB;

/// An entry in the global output index
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    /// One-time public key of the output
    pub public_key: PublicKey,
    /// Pedersen commitment of the output, for RingCT outputs
    pub commitment: Option<PublicKey>,
    /// Transaction containing the output
    pub tx_hash: Hash256,
    /// Position of the output within its transaction
    pub index_in_tx: u64,
}

pub trait BlockchainDB: Send + Sync {
    /// Number of outputs indexed under the given amount (0 for RingCT outputs)
    fn get_num_outputs(&self, amount: u64) -> Result<u64>;

    /// Looks up outputs by their absolute offsets within an amount bucket
    fn get_output_keys(&self, amount: u64, absolute_offsets: &[u64]) -> Result<Vec<OutputData>>;

    /// Resolves absolute offsets to (transaction hash, index in transaction) pairs
    fn get_output_tx_and_index(
        &self,
        amount: u64,
        absolute_offsets: &[u64],
    ) -> Result<Vec<(Hash256, u64)>> {
        Ok(self
            .get_output_keys(amount, absolute_offsets)?
            .into_iter()
            .map(|output| (output.tx_hash, output.index_in_tx))
            .collect())
    }

    /// Gets a confirmed transaction by its hash
    fn get_transaction(&self, id: &Hash256) -> Result<Transaction>;
}
