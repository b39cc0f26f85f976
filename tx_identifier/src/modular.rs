use std::collections::HashMap;

use common::Transaction;
use crypto::PublicKey;

use crate::{
    FoundPaymentId, Identified, Identifier, IdentifierKind, InputInfo, OutputInfo, Result,
};

/// Anything carrying an amount that can be totalled
pub trait HasAmount {
    fn amount(&self) -> u64;
}

impl HasAmount for OutputInfo {
    fn amount(&self) -> u64 {
        self.amount
    }
}

impl HasAmount for InputInfo {
    fn amount(&self) -> u64 {
        self.amount
    }
}

/// Sum of the amounts of identified outputs or inputs
pub fn calc_total<T: HasAmount>(infos: &[T]) -> u64 {
    infos.iter().map(HasAmount::amount).sum()
}

/// Runs a set of identifiers over a single transaction
///
/// The transaction public keys are read from extra once and handed to every identifier.
/// Identifiers run in the order they were added and can be looked up by kind afterwards.
pub struct ModularIdentifier<'a> {
    tx: &'a Transaction,
    tx_public_key: PublicKey,
    additional_public_keys: Vec<PublicKey>,
    identifiers: Vec<Box<dyn Identifier + 'a>>,
    by_kind: HashMap<IdentifierKind, usize>,
}

impl<'a> ModularIdentifier<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        ModularIdentifier {
            tx,
            tx_public_key: tx.tx_public_key(),
            additional_public_keys: tx.additional_public_keys(),
            identifiers: Vec::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Adds an identifier. A later identifier of the same kind shadows an earlier one in
    /// lookups
    pub fn push(&mut self, identifier: Box<dyn Identifier + 'a>) {
        self.by_kind
            .insert(identifier.kind(), self.identifiers.len());
        self.identifiers.push(identifier);
    }

    pub fn with<I: Identifier + 'a>(mut self, identifier: I) -> Self {
        self.push(Box::new(identifier));
        self
    }

    /// Runs every identifier, stopping at the first failure
    pub fn identify(&mut self) -> Result<()> {
        for identifier in &mut self.identifiers {
            log::trace!("Running {:?} identifier", identifier.kind());
            identifier.identify(self.tx, &self.tx_public_key, &self.additional_public_keys)?;
        }
        Ok(())
    }

    pub fn tx(&self) -> &Transaction {
        self.tx
    }

    pub fn tx_public_key(&self) -> &PublicKey {
        &self.tx_public_key
    }

    pub fn additional_public_keys(&self) -> &[PublicKey] {
        &self.additional_public_keys
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn get(&self, kind: IdentifierKind) -> Option<&dyn Identifier> {
        let index = *self.by_kind.get(&kind)?;
        self.get_index(index)
    }

    pub fn get_index(&self, index: usize) -> Option<&dyn Identifier> {
        self.identifiers
            .get(index)
            .map(|identifier| identifier.as_ref() as &dyn Identifier)
    }

    /// Identifiers in the order they run
    pub fn identifiers(&self) -> &[Box<dyn Identifier + 'a>] {
        &self.identifiers
    }

    /// Outputs found by the output identifier, if there is one
    pub fn outputs(&self) -> Option<&[OutputInfo]> {
        match self.get(IdentifierKind::Output)?.identified() {
            Identified::Outputs(outputs) => Some(outputs),
            _ => None,
        }
    }

    /// Inputs found by the input identifier of the given kind
    pub fn inputs(&self, kind: IdentifierKind) -> Option<&[InputInfo]> {
        match self.get(kind)?.identified() {
            Identified::Inputs(inputs) => Some(inputs),
            _ => None,
        }
    }

    /// Payment ID found by the payment ID identifier of the given kind
    pub fn payment_id(&self, kind: IdentifierKind) -> Option<FoundPaymentId> {
        match self.get(kind)?.identified() {
            Identified::PaymentId(payment_id) => payment_id,
            _ => None,
        }
    }
}
