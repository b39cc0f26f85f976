use anyhow::Context;
use serde::{Deserialize, Serialize};

use common::Transaction;

/// A transaction to identify, along with the transactions its ring members come from
///
/// Transactions are hex encoded bincode blobs. Outputs are indexed in the order the ring
/// transactions are listed.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScanRequest {
    pub tx: String,
    #[serde(default)]
    pub ring_transactions: Vec<String>,
}

impl ScanRequest {
    pub fn transaction(&self) -> anyhow::Result<Transaction> {
        decode(&self.tx)
    }

    pub fn ring_transactions(&self) -> anyhow::Result<Vec<Transaction>> {
        self.ring_transactions.iter().map(|blob| decode(blob)).collect()
    }
}

fn decode(blob: &str) -> anyhow::Result<Transaction> {
    let bytes = hex::decode(blob).context("Transaction blob is not hex")?;
    bincode::deserialize(&bytes).context("Cannot deserialize transaction")
}
