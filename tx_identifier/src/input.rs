use std::collections::hash_map::{Entry, HashMap};
use std::fmt::{Display, Formatter};

use serde::Serialize;

use ensure_macro::ensure;

use blockchain_db::{BlockchainDB, OutputData};
use common::{relative_output_offsets_to_absolute, TXIn, Transaction};
use crypto::{Hash256, KeyImage, PublicKey};
use transaction_util::AccountKeys;

use crate::{
    output::identify_outputs, Error, Identified, Identifier, IdentifierKind, MatchPolicy,
    OutputInfo, Result, ScanKeys,
};

/// Public keys of outputs known to belong to the account, with their amounts
pub type KnownOutputs = HashMap<PublicKey, u64>;

/// An input attributed to the account
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputInfo {
    pub key_image: KeyImage,
    /// Amount of the owned ring member
    pub amount: u64,
    /// Public key of the owned ring member
    pub output_public_key: PublicKey,
}

impl Display for InputInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            hex::encode(self.key_image.as_bytes()),
            hex::encode(self.output_public_key.as_bytes()),
            self.amount
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    Unscanned,
    Scanning,
    Scanned,
}

impl Default for ScanState {
    fn default() -> Self {
        ScanState::Unscanned
    }
}

/// A key input with its ring members resolved
struct Ring<'t> {
    key_image: &'t KeyImage,
    members: Vec<OutputData>,
}

/// Resolves the ring of every key input. Rings referring past the end of their amount
/// bucket are skipped
fn resolve_rings<'t>(db: &dyn BlockchainDB, tx: &'t Transaction) -> Result<Vec<Ring<'t>>> {
    let mut rings = Vec::new();

    for input in &tx.prefix.inputs {
        let (amount, key_offsets, key_image) = match input {
            TXIn::FromKey {
                amount,
                key_offsets,
                key_image,
            } => (*amount, key_offsets, key_image),
            TXIn::Gen(_) => continue,
        };

        let absolute_offsets = relative_output_offsets_to_absolute(key_offsets);
        let last = match absolute_offsets.iter().max() {
            Some(last) => *last,
            None => continue,
        };
        let num_outputs = db.get_num_outputs(amount)?;
        if last >= num_outputs {
            log::debug!(
                "Skipping ring of key image {}: offset {} of {} outputs",
                hex::encode(key_image.as_bytes()),
                last,
                num_outputs
            );
            continue;
        }

        rings.push(Ring {
            key_image,
            members: db.get_output_keys(amount, &absolute_offsets)?,
        });
    }

    Ok(rings)
}

/// Attributes ring members found in `known` to the account
fn match_known(rings: &[Ring<'_>], known: &KnownOutputs, policy: MatchPolicy) -> Vec<InputInfo> {
    let mut identified = Vec::new();

    for ring in rings {
        for member in &ring.members {
            let amount = match known.get(&member.public_key) {
                Some(amount) => *amount,
                None => continue,
            };
            log::debug!(
                "Key image {} spends known output {}",
                hex::encode(ring.key_image.as_bytes()),
                hex::encode(member.public_key.as_bytes())
            );
            identified.push(InputInfo {
                key_image: *ring.key_image,
                amount,
                output_public_key: member.public_key,
            });
            if policy == MatchPolicy::FirstMatch {
                break;
            }
        }
    }

    identified
}

/// Scans the transactions ring members come from, once each
struct OriginScanner<'s, 'a> {
    keys: &'s ScanKeys<'a>,
    db: &'s dyn BlockchainDB,
    scanned: HashMap<Hash256, Vec<OutputInfo>>,
}

impl<'s, 'a> OriginScanner<'s, 'a> {
    fn new(keys: &'s ScanKeys<'a>, db: &'s dyn BlockchainDB) -> Self {
        OriginScanner {
            keys,
            db,
            scanned: HashMap::new(),
        }
    }

    /// The account's outputs in the given transaction
    fn outputs_of(&mut self, tx_hash: &Hash256) -> Result<&[OutputInfo]> {
        match self.scanned.entry(*tx_hash) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_slice()),
            Entry::Vacant(entry) => {
                let tx = self.db.get_transaction(tx_hash).map_err(|error| match error {
                    blockchain_db::Error::DoesNotExist => Error::TransactionNotFound(*tx_hash),
                    error => error.into(),
                })?;
                log::trace!("Scanning ring member transaction <{}>", tx_hash);

                let found = identify_outputs(
                    self.keys,
                    &tx,
                    &tx.tx_public_key(),
                    &tx.additional_public_keys(),
                )?;
                Ok(entry.insert(found).as_slice())
            }
        }
    }
}

fn sum(identified: &[InputInfo]) -> u64 {
    identified.iter().map(|input| input.amount).sum()
}

/// Finds inputs whose rings contain outputs already known to belong to the account
pub struct Input<'a> {
    db: &'a dyn BlockchainDB,
    known: KnownOutputs,
    policy: MatchPolicy,
    state: ScanState,
    identified: Vec<InputInfo>,
    total: u64,
}

impl<'a> Input<'a> {
    pub fn new(db: &'a dyn BlockchainDB, known: KnownOutputs) -> Self {
        Input {
            db,
            known,
            policy: MatchPolicy::default(),
            state: ScanState::default(),
            identified: Vec::new(),
            total: 0,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn known_outputs(&self) -> &KnownOutputs {
        &self.known
    }

    pub fn inputs(&self) -> &[InputInfo] {
        &self.identified
    }

    pub fn state(&self) -> ScanState {
        self.state
    }
}

impl<'a> Identifier for Input<'a> {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Input
    }

    fn identify(&mut self, tx: &Transaction, _: &PublicKey, _: &[PublicKey]) -> Result<()> {
        self.state = ScanState::Scanning;
        let rings = resolve_rings(self.db, tx).map_err(|error| {
            self.state = ScanState::Unscanned;
            error
        })?;

        self.identified = match_known(&rings, &self.known, self.policy);
        self.total = sum(&self.identified);
        self.state = ScanState::Scanned;
        Ok(())
    }

    fn identified(&self) -> Identified<'_> {
        Identified::Inputs(&self.identified)
    }

    fn total(&self) -> u64 {
        self.total
    }
}

/// Guesses which inputs spend the account's outputs using only the view key
///
/// The transactions of all ring members are scanned for the account's outputs, and any ring
/// containing one is attributed to the account. Decoys that happen to be the account's
/// outputs are attributed as well.
pub struct GuessInput<'a> {
    keys: ScanKeys<'a>,
    db: &'a dyn BlockchainDB,
    policy: MatchPolicy,
    known: KnownOutputs,
    state: ScanState,
    identified: Vec<InputInfo>,
    total: u64,
}

impl<'a> GuessInput<'a> {
    pub fn new(keys: ScanKeys<'a>, db: &'a dyn BlockchainDB) -> Self {
        GuessInput {
            keys,
            db,
            policy: MatchPolicy::default(),
            known: KnownOutputs::new(),
            state: ScanState::default(),
            identified: Vec::new(),
            total: 0,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Outputs of the account found among the ring members of the last transaction
    pub fn known_outputs(&self) -> &KnownOutputs {
        &self.known
    }

    pub fn inputs(&self) -> &[InputInfo] {
        &self.identified
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    fn guess(&self, tx: &Transaction) -> Result<(KnownOutputs, Vec<InputInfo>)> {
        let rings = resolve_rings(self.db, tx)?;
        let mut scanner = OriginScanner::new(&self.keys, self.db);

        let mut known = KnownOutputs::new();
        for ring in &rings {
            for member in &ring.members {
                let found = scanner.outputs_of(&member.tx_hash)?;
                known.extend(found.iter().map(|output| (output.public_key, output.amount)));
            }
        }

        let identified = match_known(&rings, &known, self.policy);
        Ok((known, identified))
    }
}

impl<'a> Identifier for GuessInput<'a> {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::GuessInput
    }

    fn identify(&mut self, tx: &Transaction, _: &PublicKey, _: &[PublicKey]) -> Result<()> {
        self.state = ScanState::Scanning;
        match self.guess(tx) {
            Ok((known, identified)) => {
                self.known = known;
                self.total = sum(&identified);
                self.identified = identified;
                self.state = ScanState::Scanned;
                Ok(())
            }
            Err(error) => {
                self.state = ScanState::Unscanned;
                Err(error)
            }
        }
    }

    fn identified(&self) -> Identified<'_> {
        Identified::Inputs(&self.identified)
    }

    fn total(&self) -> u64 {
        self.total
    }
}

/// Finds the inputs the account actually spent, by regenerating key images with the spend
/// key
pub struct RealInput<'a> {
    keys: ScanKeys<'a>,
    db: &'a dyn BlockchainDB,
    state: ScanState,
    identified: Vec<InputInfo>,
    total: u64,
}

impl<'a> RealInput<'a> {
    pub fn new(keys: ScanKeys<'a>, db: &'a dyn BlockchainDB) -> Result<Self> {
        ensure!(keys.spend_key.is_some(), Error::MissingSpendKey);
        Ok(RealInput {
            keys,
            db,
            state: ScanState::default(),
            identified: Vec::new(),
            total: 0,
        })
    }

    pub fn inputs(&self) -> &[InputInfo] {
        &self.identified
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Key image of an output found by scanning with these keys
    ///
    /// Subaddress aware when the receiving index is known, otherwise derived directly from
    /// the address's spend key
    fn key_image(&self, output: &OutputInfo) -> Result<KeyImage> {
        let device = self.keys.device;
        let spend_key = self.keys.spend_key.ok_or(Error::MissingSpendKey)?;

        let subaddress_aware = match (self.keys.primary, self.keys.subaddress_index) {
            (Some(primary), _) => primary
                .keys()
                .cloned()
                .map(|keys| (keys, output.effective_subaddress_index())),
            (None, Some(index)) => self
                .keys
                .view_key
                .map(|view_key| (AccountKeys::from_secret_keys(*spend_key, *view_key), index)),
            (None, None) => None,
        };

        let key_image = match subaddress_aware {
            Some((account_keys, index)) => device
                .generate_key_image_subaddress_aware(
                    &account_keys,
                    &output.public_key,
                    &output.derivation,
                    output.index_in_tx,
                    &index,
                )
                .map(|(_, key_image)| key_image),
            None => device.generate_key_image(
                &output.derivation,
                output.index_in_tx,
                spend_key,
                &self.keys.address.spend_public_key,
            ),
        };
        key_image.map_err(Error::KeyImage)
    }

    fn find(&self, tx: &Transaction) -> Result<Vec<InputInfo>> {
        let rings = resolve_rings(self.db, tx)?;
        let mut scanner = OriginScanner::new(&self.keys, self.db);
        let mut identified = Vec::new();

        for ring in &rings {
            'ring: for member in &ring.members {
                for output in scanner.outputs_of(&member.tx_hash)? {
                    if &self.key_image(output)? != ring.key_image {
                        continue;
                    }
                    log::debug!(
                        "Key image {} is ours, spending {}",
                        hex::encode(ring.key_image.as_bytes()),
                        hex::encode(output.public_key.as_bytes())
                    );
                    identified.push(InputInfo {
                        key_image: *ring.key_image,
                        amount: output.amount,
                        output_public_key: output.public_key,
                    });
                    break 'ring;
                }
            }
        }

        Ok(identified)
    }
}

impl<'a> Identifier for RealInput<'a> {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::RealInput
    }

    fn identify(&mut self, tx: &Transaction, _: &PublicKey, _: &[PublicKey]) -> Result<()> {
        self.state = ScanState::Scanning;
        match self.find(tx) {
            Ok(identified) => {
                self.total = sum(&identified);
                self.identified = identified;
                self.state = ScanState::Scanned;
                Ok(())
            }
            Err(error) => {
                self.state = ScanState::Unscanned;
                Err(error)
            }
        }
    }

    fn identified(&self) -> Identified<'_> {
        Identified::Inputs(&self.identified)
    }

    fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_definitions::*;
    use crate::{calc_total, scan_transaction, PrimaryAccount};
    use crypto::{ecc::Scalar, KeyPair};
    use transaction_util::SubAddressIndex;

    struct Spend {
        chain: TestChain,
        funding: Transaction,
        spend: Transaction,
    }

    /// Two funding outputs of 1000 and 250. The first is spent, the second only appears
    /// as a decoy in another input
    fn spend_scenario(keys: &AccountKeys) -> Spend {
        let mut chain = TestChain::new();
        chain.add_decoys(100, 4);

        let funding = TxBuilder::new(101)
            .pay(&keys.address(), 1000)
            .pay(&keys.address(), 250)
            .build();
        let first = chain.add(funding.clone());
        chain.add_decoys(102, 4);

        let stranger = KeyPair::from(Scalar::from(999u64)).public_key;
        let spend = TxBuilder::new(103)
            .spend(&[0, first, 5], key_image_of(keys, &funding, 0, SubAddressIndex::PRIMARY))
            .spend(&[1, first + 1, 6], stranger)
            .pay(&account_keys(51).address(), 600)
            .pay(&keys.address(), 300)
            .fee(100)
            .build();

        Spend {
            chain,
            funding,
            spend,
        }
    }

    #[test]
    fn real_inputs_are_a_subset_of_guessed_inputs() {
        let keys = account_keys(50);
        let scenario = spend_scenario(&keys);
        let address = keys.address();
        let spend_key = keys.spend_secret_key.unwrap();
        let view_keys = ScanKeys::new(&address, &keys.view_keypair.secret_key);
        let spend_keys = view_keys.with_spend_key(&spend_key);

        let mut guess = GuessInput::new(view_keys, scenario.chain.db());
        assert_eq!(guess.state(), ScanState::Unscanned);
        guess
            .identify(&scenario.spend, &scenario.spend.tx_public_key(), &[])
            .unwrap();
        assert_eq!(guess.state(), ScanState::Scanned);
        assert_eq!(guess.inputs().len(), 2);
        assert_eq!(guess.total(), 1250);
        assert_eq!(guess.known_outputs().len(), 2);

        let mut real = RealInput::new(spend_keys, scenario.chain.db()).unwrap();
        real.identify(&scenario.spend, &scenario.spend.tx_public_key(), &[])
            .unwrap();
        assert_eq!(real.inputs().len(), 1);
        assert_eq!(real.total(), 1000);
        assert!(real
            .inputs()
            .iter()
            .all(|input| guess.inputs().contains(input)));

        let funded = scan_transaction(&view_keys, &scenario.funding).unwrap();
        assert_eq!(real.inputs()[0].output_public_key, funded[0].public_key);
    }

    #[test]
    fn guesses_cover_a_spend_of_the_second_owned_member() {
        let keys = account_keys(59);
        let mut chain = TestChain::new();
        chain.add_decoys(105, 3);
        let funding = TxBuilder::new(106)
            .pay(&keys.address(), 1000)
            .pay(&keys.address(), 250)
            .build();
        let first = chain.add(funding.clone());
        let spend = TxBuilder::new(107)
            .spend(
                &[1, first, first + 1],
                key_image_of(&keys, &funding, 1, SubAddressIndex::PRIMARY),
            )
            .pay(&account_keys(60).address(), 200)
            .fee(50)
            .build();

        let address = keys.address();
        let spend_key = keys.spend_secret_key.unwrap();
        let view_keys = ScanKeys::new(&address, &keys.view_keypair.secret_key);

        let mut guess = GuessInput::new(view_keys, chain.db());
        guess.identify(&spend, &spend.tx_public_key(), &[]).unwrap();
        assert_eq!(guess.inputs().len(), 2);
        assert_eq!(guess.total(), 1250);

        let mut real = RealInput::new(view_keys.with_spend_key(&spend_key), chain.db()).unwrap();
        real.identify(&spend, &spend.tx_public_key(), &[]).unwrap();
        assert_eq!(real.total(), 250);
        assert!(real
            .inputs()
            .iter()
            .all(|input| guess.inputs().contains(input)));

        let mut first_only = GuessInput::new(view_keys, chain.db())
            .with_policy(MatchPolicy::FirstMatch);
        first_only
            .identify(&spend, &spend.tx_public_key(), &[])
            .unwrap();
        assert_eq!(first_only.total(), 1000);
    }

    #[test]
    fn amounts_are_conserved() {
        let keys = account_keys(52);
        let scenario = spend_scenario(&keys);
        let address = keys.address();
        let spend_key = keys.spend_secret_key.unwrap();
        let scan_keys =
            ScanKeys::new(&address, &keys.view_keypair.secret_key).with_spend_key(&spend_key);

        let mut real = RealInput::new(scan_keys, scenario.chain.db()).unwrap();
        real.identify(&scenario.spend, &scenario.spend.tx_public_key(), &[])
            .unwrap();
        let change = scan_transaction(&scan_keys, &scenario.spend).unwrap();

        let sent = calc_total(real.inputs()) - calc_total(&change) - scenario.spend.fee();
        assert_eq!(sent, 600);
    }

    #[test]
    fn the_match_policy_decides_how_many_members_count() {
        let mut chain = TestChain::new();
        chain.add_decoys(110, 3);
        let decoys: Vec<PublicKey> = chain
            .db()
            .get_output_keys(0, &[0, 1, 2])
            .unwrap()
            .into_iter()
            .map(|output| output.public_key)
            .collect();
        let key_image = KeyPair::from(Scalar::from(5u64)).public_key;
        let tx = TxBuilder::new(111).spend(&[0, 1, 2], key_image).build();

        let known: KnownOutputs = vec![(decoys[1], 7), (decoys[2], 9)].into_iter().collect();

        let mut first =
            Input::new(chain.db(), known.clone()).with_policy(MatchPolicy::FirstMatch);
        first.identify(&tx, &tx.tx_public_key(), &[]).unwrap();
        assert_eq!(
            first.inputs(),
            &[InputInfo {
                key_image,
                amount: 7,
                output_public_key: decoys[1],
            }]
        );

        let mut all = Input::new(chain.db(), known);
        all.identify(&tx, &tx.tx_public_key(), &[]).unwrap();
        assert_eq!(all.inputs().len(), 2);
        assert_eq!(all.total(), 16);
        assert_eq!(all.known_outputs().len(), 2);
    }

    #[test]
    fn rings_past_the_known_outputs_are_skipped() {
        let keys = account_keys(53);
        let mut chain = TestChain::new();
        chain.add_decoys(120, 2);
        let key_image = KeyPair::from(Scalar::from(6u64)).public_key;
        let tx = TxBuilder::new(121).spend(&[0, 1, 2], key_image).build();

        let address = keys.address();
        let mut guess = GuessInput::new(
            ScanKeys::new(&address, &keys.view_keypair.secret_key),
            chain.db(),
        );
        guess.identify(&tx, &tx.tx_public_key(), &[]).unwrap();
        assert!(guess.inputs().is_empty());
        assert_eq!(guess.state(), ScanState::Scanned);
    }

    #[test]
    fn missing_ring_member_transactions_fail_the_scan() {
        let keys = account_keys(54);
        let mut chain = TestChain::new();
        let hash = chain.db_mut().add_transaction(TxBuilder::new(130).pay(&keys.address(), 1).build())
            .unwrap();
        let key_image = KeyPair::from(Scalar::from(7u64)).public_key;
        let tx = TxBuilder::new(131).spend(&[0], key_image).build();

        let forgetful = ForgetfulDB(chain.into_db());
        let address = keys.address();
        let mut guess = GuessInput::new(
            ScanKeys::new(&address, &keys.view_keypair.secret_key),
            &forgetful,
        );
        match guess.identify(&tx, &tx.tx_public_key(), &[]) {
            Err(Error::TransactionNotFound(missing)) => assert_eq!(missing, hash),
            _ => panic!("Expected a missing transaction"),
        }
        assert_eq!(guess.state(), ScanState::Unscanned);
    }

    #[test]
    fn real_inputs_need_the_spend_key() {
        let keys = account_keys(55);
        let address = keys.address();
        let chain = TestChain::new();
        assert!(matches!(
            RealInput::new(
                ScanKeys::new(&address, &keys.view_keypair.secret_key),
                chain.db()
            ),
            Err(Error::MissingSpendKey)
        ));
    }

    #[test]
    fn spends_from_subaddresses_need_subaddress_awareness() {
        let keys = account_keys(56);
        let primary = small_primary(&keys);
        primary.populate_subaddress_indices(0, 3).unwrap();
        let subaddress = primary.generate_subaddress(SubAddressIndex(1, 2)).unwrap();

        let mut chain = TestChain::new();
        chain.add_decoys(140, 2);
        let funding = TxBuilder::new(141)
            .pay(subaddress.address().unwrap(), 500)
            .build();
        let offset = chain.add(funding.clone());
        let key_image = key_image_of(&keys, &funding, 0, SubAddressIndex(1, 2));
        let spend = TxBuilder::new(142)
            .spend(&[0, 1, offset], key_image)
            .pay(&account_keys(57).address(), 480)
            .fee(20)
            .build();

        let mut aware = RealInput::new(ScanKeys::from_primary(&primary).unwrap(), chain.db())
            .unwrap();
        aware
            .identify(&spend, &spend.tx_public_key(), &[])
            .unwrap();
        assert_eq!(aware.total(), 500);
        assert_eq!(aware.inputs()[0].key_image, key_image);

        let mut from_subaddress =
            RealInput::new(ScanKeys::from_subaddress(&subaddress).unwrap(), chain.db()).unwrap();
        from_subaddress
            .identify(&spend, &spend.tx_public_key(), &[])
            .unwrap();
        assert_eq!(from_subaddress.inputs(), aware.inputs());

        let address = keys.address();
        let spend_key = keys.spend_secret_key.unwrap();
        let mut bare = RealInput::new(
            ScanKeys::new(&address, &keys.view_keypair.secret_key).with_spend_key(&spend_key),
            chain.db(),
        )
        .unwrap();
        bare.identify(&spend, &spend.tx_public_key(), &[]).unwrap();
        assert!(bare.inputs().is_empty());
    }

    #[test]
    fn primary_accounts_spend_primary_outputs() {
        let keys = account_keys(58);
        let primary = PrimaryAccount::new(primary_account(&keys)).unwrap();
        let scenario = spend_scenario(&keys);

        let mut real = RealInput::new(ScanKeys::from_primary(&primary).unwrap(), scenario.chain.db())
            .unwrap();
        real.identify(&scenario.spend, &scenario.spend.tx_public_key(), &[])
            .unwrap();
        assert_eq!(real.total(), 1000);
    }

    #[test]
    fn it_displays_input_info() {
        let key = KeyPair::from(Scalar::from(3u64)).public_key;
        let info = InputInfo {
            key_image: key,
            amount: 12,
            output_public_key: key,
        };
        let hex = hex::encode(key.as_bytes());
        assert_eq!(info.to_string(), format!("{}, {}, 12", hex, hex));
    }
}
