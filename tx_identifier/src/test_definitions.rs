#![cfg(test)]

use blockchain_db::{BlockchainDB, BlockchainMemDB, OutputData};
use common::{
    serialize_extra, ExtraNonce, TXExtra, TXIn, TXOut, TXOutTarget, Transaction,
    TransactionPrefix,
};
use crypto::{ecc, Hash256, Hash8, KeyImage, KeyPair, PublicKey, SecretKey};
use ringct::{ecdh_utils, Commitment, RingCTBase, RingCTType};
use transaction_util::{default_device, AccountKeys, Address, NetworkType, SubAddressIndex};

use crate::{Account, Lookahead, PrimaryAccount};

pub const TEST_NETWORK: NetworkType = NetworkType::Mainnet;

/// Deterministic keys of a test account
pub fn account_keys(seed: u64) -> AccountKeys {
    AccountKeys::from(ecc::hash_data_to_scalar(&seed.to_le_bytes()))
}

/// A primary account holding both secret keys
pub fn primary_account(keys: &AccountKeys) -> Account {
    Account::new(
        TEST_NETWORK,
        keys.address(),
        Some(keys.view_keypair.secret_key),
        keys.spend_secret_key,
    )
    .unwrap()
}

/// A primary account with a 3 x 5 subaddress window
pub fn small_primary(keys: &AccountKeys) -> PrimaryAccount {
    PrimaryAccount::with_lookahead(primary_account(keys), Lookahead { major: 3, minor: 5 })
        .unwrap()
}

/// Key image of output `index` of `tx`, sent to `keys` at the given subaddress
pub fn key_image_of(
    keys: &AccountKeys,
    tx: &Transaction,
    index: usize,
    subaddress_index: SubAddressIndex,
) -> KeyImage {
    let device = default_device();
    let derivation = device
        .generate_key_derivation(&tx.tx_public_key(), &keys.view_keypair.secret_key)
        .unwrap();
    let output_key = match &tx.prefix.outputs[index].target {
        TXOutTarget::ToKey { key } => *key,
        TXOutTarget::ToScriptHash { .. } => panic!("Not a key output"),
    };

    device
        .generate_key_image_subaddress_aware(
            keys,
            &output_key,
            &derivation,
            index as u64,
            &subaddress_index,
        )
        .unwrap()
        .1
}

/// Builds transactions the way a wallet would
pub struct TxBuilder {
    tx_secret_key: SecretKey,
    version: usize,
    coinbase: Option<u64>,
    rct_type: RingCTType,
    destinations: Vec<(Address, u64)>,
    additional_keys: bool,
    inputs: Vec<TXIn>,
    fee: u64,
    nonce: Option<ExtraNonce>,
    encrypted_payment_id: Option<Hash8>,
    stale_public_key: Option<PublicKey>,
}

impl TxBuilder {
    /// The transaction secret key is derived from `seed`
    pub fn new(seed: u64) -> Self {
        let mut data = b"tx".to_vec();
        data.extend_from_slice(&seed.to_le_bytes());

        TxBuilder {
            tx_secret_key: ecc::hash_data_to_scalar(&data),
            version: 2,
            coinbase: None,
            rct_type: RingCTType::CLSAG,
            destinations: Vec::new(),
            additional_keys: false,
            inputs: Vec::new(),
            fee: 0,
            nonce: None,
            encrypted_payment_id: None,
            stale_public_key: None,
        }
    }

    pub fn version(mut self, version: usize) -> Self {
        self.version = version;
        self
    }

    pub fn coinbase(mut self, height: u64) -> Self {
        self.coinbase = Some(height);
        self
    }

    pub fn rct_type(mut self, rct_type: RingCTType) -> Self {
        self.rct_type = rct_type;
        self
    }

    pub fn pay(mut self, address: &Address, amount: u64) -> Self {
        self.destinations.push((address.clone(), amount));
        self
    }

    /// Gives every output its own public key
    pub fn with_additional_keys(mut self) -> Self {
        self.additional_keys = true;
        self
    }

    /// Adds a RingCT input with the given ring (absolute offsets) and key image
    pub fn spend(mut self, offsets: &[u64], key_image: KeyImage) -> Self {
        let mut absolute = offsets.to_vec();
        absolute.sort_unstable();

        let mut previous = 0;
        let key_offsets = absolute
            .iter()
            .map(|offset| {
                let relative = offset - previous;
                previous = *offset;
                relative
            })
            .collect();

        self.inputs.push(TXIn::FromKey {
            amount: 0,
            key_offsets,
            key_image,
        });
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn payment_id(mut self, payment_id: Hash256) -> Self {
        self.nonce = Some(ExtraNonce::PaymentId(payment_id));
        self
    }

    /// Encrypts the payment ID towards the first destination
    pub fn encrypted_payment_id(mut self, payment_id: Hash8) -> Self {
        self.encrypted_payment_id = Some(payment_id);
        self
    }

    /// Adds an unrelated public key in front of the real one
    pub fn stale_public_key(mut self, public_key: &PublicKey) -> Self {
        self.stale_public_key = Some(*public_key);
        self
    }

    fn additional_secret_key(&self, index: usize) -> SecretKey {
        let mut data = self.tx_secret_key.to_bytes().to_vec();
        data.extend_from_slice(&(index as u64).to_le_bytes());
        ecc::hash_data_to_scalar(&data)
    }

    pub fn build(self) -> Transaction {
        let device = default_device();
        let r = self.tx_secret_key;
        let has_rct_amounts = self.version >= 2 && self.coinbase.is_none();

        // Transactions to a single subaddress use its spend key as the base
        let tx_public_key = match self.destinations.as_slice() {
            [(address, _)] if address.is_subaddress() && !self.additional_keys => {
                (r * address.spend_public_key.decompress().unwrap()).compress()
            }
            _ => KeyPair::from(r).public_key,
        };

        let mut outputs = Vec::new();
        let mut additional_public_keys = Vec::new();
        let mut ecdh_exchange = Vec::new();
        let mut output_commitments = Vec::new();

        for (i, (address, amount)) in self.destinations.iter().enumerate() {
            let secret_key = if self.additional_keys {
                let secret_key = self.additional_secret_key(i);
                let public_key = if address.is_subaddress() {
                    (secret_key * address.spend_public_key.decompress().unwrap()).compress()
                } else {
                    KeyPair::from(secret_key).public_key
                };
                additional_public_keys.push(public_key);
                secret_key
            } else {
                r
            };

            let index = i as u64;
            let derivation = device
                .generate_key_derivation(&address.view_public_key, &secret_key)
                .unwrap();
            let key = device
                .derive_public_key(&derivation, index, &address.spend_public_key)
                .unwrap();

            if has_rct_amounts {
                let shared_secret = derivation.to_scalar(index);
                let mask = if self.rct_type.is_compact() {
                    ecdh_utils::commitment_mask(&shared_secret)
                } else {
                    ecc::hash_data_to_scalar(key.as_bytes())
                };
                let commitment = Commitment {
                    amount: *amount,
                    mask,
                };
                ecdh_exchange.push(ringct::encode(self.rct_type, &commitment, &shared_secret).unwrap());
                output_commitments.push(commitment.to_public().compress());
            }

            outputs.push(TXOut {
                amount: if has_rct_amounts { 0 } else { *amount },
                target: TXOutTarget::ToKey { key },
            });
        }

        let mut fields = Vec::new();
        if let Some(stale) = self.stale_public_key {
            fields.push(TXExtra::TxPublicKey(stale));
        }
        fields.push(TXExtra::TxPublicKey(tx_public_key));

        let nonce = match (self.encrypted_payment_id, &self.nonce) {
            (Some(payment_id), _) => {
                let view_public_key = self.destinations[0].0.view_public_key;
                let encrypted = device
                    .encrypt_payment_id(payment_id, &view_public_key, &r)
                    .unwrap();
                Some(ExtraNonce::EncryptedPaymentId(encrypted))
            }
            (None, nonce) => nonce.clone(),
        };
        if let Some(nonce) = nonce {
            fields.push(TXExtra::TxNonce(nonce.to_bytes()));
        }
        if !additional_public_keys.is_empty() {
            fields.push(TXExtra::TxAdditionalPublicKeys(additional_public_keys));
        }

        let inputs = match self.coinbase {
            Some(height) => vec![TXIn::Gen(height)],
            None => self.inputs,
        };
        let rct_signatures = if self.version >= 2 {
            RingCTBase {
                signature_type: if has_rct_amounts {
                    self.rct_type
                } else {
                    RingCTType::Null
                },
                ecdh_exchange,
                output_commitments,
                fee: self.fee,
            }
        } else {
            RingCTBase::default()
        };

        Transaction {
            prefix: TransactionPrefix {
                version: self.version,
                unlock_time: 0,
                inputs,
                outputs,
                extra: serialize_extra(&fields),
            },
            rct_signatures,
        }
    }
}

/// An in-memory chain of RingCT transactions
pub struct TestChain {
    db: BlockchainMemDB,
}

impl TestChain {
    pub fn new() -> Self {
        TestChain {
            db: BlockchainMemDB::new(),
        }
    }

    /// Adds a transaction, returning the global offset of its first output
    pub fn add(&mut self, tx: Transaction) -> u64 {
        let first = self.db.get_num_outputs(0).unwrap();
        self.db.add_transaction(tx).unwrap();
        first
    }

    /// Adds `count` transactions with a single output to a stranger each
    pub fn add_decoys(&mut self, seed: u64, count: u64) {
        for i in 0..count {
            let decoy_seed = 1_000_000 + seed * 100 + i;
            let tx = TxBuilder::new(decoy_seed)
                .pay(&account_keys(decoy_seed).address(), 1)
                .build();
            self.add(tx);
        }
    }

    pub fn db(&self) -> &BlockchainMemDB {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut BlockchainMemDB {
        &mut self.db
    }

    pub fn into_db(self) -> BlockchainMemDB {
        self.db
    }
}

/// Indexes outputs but has lost every transaction
pub struct ForgetfulDB(pub BlockchainMemDB);

impl BlockchainDB for ForgetfulDB {
    fn get_num_outputs(&self, amount: u64) -> blockchain_db::Result<u64> {
        self.0.get_num_outputs(amount)
    }

    fn get_output_keys(
        &self,
        amount: u64,
        absolute_offsets: &[u64],
    ) -> blockchain_db::Result<Vec<OutputData>> {
        self.0.get_output_keys(amount, absolute_offsets)
    }

    fn get_transaction(&self, _: &Hash256) -> blockchain_db::Result<Transaction> {
        Err(blockchain_db::Error::DoesNotExist)
    }
}
