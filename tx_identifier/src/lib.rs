//! # Transaction identification
//! Finds which outputs of a transaction belong to an account, which of its inputs the
//! account (possibly) spent, and the payment ID it carries.
//!
//! Identifiers share the [`Identifier`] trait and are usually run together through a
//! [`ModularIdentifier`], which reads the transaction public keys once for all of them.

mod account;
mod config;
mod error;
mod identifier;
mod input;
mod modular;
mod output;
mod payment_id;
#[cfg(test)]
mod test_definitions;

pub use account::{
    make_account, make_primary_account, Account, AccountType, AnyAccount, PrimaryAccount,
    SubaddressAccount,
};
pub use config::{Config, Lookahead, MatchPolicy, MAX_MAJOR_EXPANSION};
pub use error::{Error, ParseError, Result};
pub use identifier::{Identified, Identifier, IdentifierKind, ScanKeys};
pub use input::{GuessInput, Input, InputInfo, KnownOutputs, RealInput, ScanState};
pub use modular::{calc_total, HasAmount, ModularIdentifier};
pub use output::{scan_transaction, Output, OutputInfo, RctOutput};
pub use payment_id::{
    FoundPaymentId, IntegratedPaymentId, LegacyPaymentId, PaymentId, PaymentIdFormat,
};
