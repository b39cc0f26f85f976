use std::collections::HashMap;

use common::{GetHash, TXOutTarget, Transaction};
use crypto::Hash256;

use crate::error::{Error, Result};
use crate::{BlockchainDB, OutputData};

/// In-memory store, indexing outputs in the order their transactions are added
#[derive(Default)]
pub struct BlockchainMemDB {
    transactions: HashMap<Hash256, Transaction>,
    outputs: HashMap<u64, Vec<OutputData>>,
}

impl BlockchainMemDB {
    pub fn new() -> BlockchainMemDB {
        BlockchainMemDB::default()
    }

    /// Adds a transaction and appends its outputs to the global output index
    ///
    /// # Returns
    /// The hash of the added transaction
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<Hash256> {
        let tx_hash = transaction.get_hash();
        if self.transactions.contains_key(&tx_hash) {
            return Err(Error::Exists);
        }

        for (index_in_tx, output) in transaction.prefix.outputs.iter().enumerate() {
            let public_key = match &output.target {
                TXOutTarget::ToKey { key } => *key,
                TXOutTarget::ToScriptHash { .. } => continue,
            };
            // RingCT outputs all share the zero amount bucket
            let amount = if transaction.is_rct() { 0 } else { output.amount };
            let commitment = if transaction.is_rct() && !transaction.is_coinbase() {
                transaction
                    .rct_signatures
                    .output_commitments
                    .get(index_in_tx)
                    .copied()
            } else {
                None
            };

            self.outputs.entry(amount).or_default().push(OutputData {
                public_key,
                commitment,
                tx_hash,
                index_in_tx: index_in_tx as u64,
            });
        }

        log::trace!("Added transaction <{}>", tx_hash);
        self.transactions.insert(tx_hash, transaction);
        Ok(tx_hash)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

impl BlockchainDB for BlockchainMemDB {
    fn get_num_outputs(&self, amount: u64) -> Result<u64> {
        Ok(self
            .outputs
            .get(&amount)
            .map(|outputs| outputs.len() as u64)
            .unwrap_or(0))
    }

    fn get_output_keys(&self, amount: u64, absolute_offsets: &[u64]) -> Result<Vec<OutputData>> {
        let bucket = self.outputs.get(&amount);
        absolute_offsets
            .iter()
            .map(|offset| {
                bucket
                    .and_then(|outputs| outputs.get(*offset as usize))
                    .cloned()
                    .ok_or(Error::OutOfRange {
                        amount,
                        offset: *offset,
                    })
            })
            .collect()
    }

    fn get_transaction(&self, id: &Hash256) -> Result<Transaction> {
        self.transactions.get(id).cloned().ok_or(Error::DoesNotExist)
    }
}
