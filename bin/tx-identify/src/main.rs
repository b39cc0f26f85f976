use anyhow::Context;
use log::{info, warn};
use serde::Serialize;
use structopt::StructOpt;

use blockchain_db::BlockchainMemDB;
use common::GetHash;
use tx_identifier::{
    calc_total, Account, AnyAccount, FoundPaymentId, GuessInput, IdentifierKind, InputInfo,
    IntegratedPaymentId, LegacyPaymentId, ModularIdentifier, Output, OutputInfo,
    PrimaryAccount, RealInput, ScanKeys, SubaddressAccount,
};

mod config;
mod request;

use config::Config;
use request::ScanRequest;

#[derive(Serialize)]
struct Report<'r> {
    tx_hash: String,
    fee: u64,
    outputs: &'r [OutputInfo],
    outputs_total: u64,
    guessed_inputs: &'r [InputInfo],
    guessed_total: u64,
    real_inputs: Option<&'r [InputInfo]>,
    real_total: Option<u64>,
    payment_id: Option<FoundPaymentId>,
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    bin_common::init_logging(&config.bin_common_config, "tx-identify")?;

    let report = run(&config)?;
    println!("{}", report);
    Ok(())
}

fn load_account(config: &Config) -> anyhow::Result<AnyAccount> {
    let account = Account::from_strings(
        config.network,
        &config.address,
        &config.viewkey,
        &config.spendkey,
    )?;
    info!("Identifying for {}", account.address_string());

    if account.is_subaddress() {
        return Ok(AnyAccount::Subaddress(SubaddressAccount::new(account, None)?));
    }

    let lookahead = config.identifier_config.lookahead();
    let primary = PrimaryAccount::with_lookahead(account, lookahead)?;
    if config.populate_subaddresses {
        primary.populate_subaddress_indices(0, lookahead.major)?;
        info!("Generated {} subaddresses", primary.subaddress_count());
    }
    Ok(AnyAccount::Primary(primary))
}

fn run(config: &Config) -> anyhow::Result<String> {
    let request_file = std::fs::read_to_string(&config.request)
        .with_context(|| format!("Cannot read {}", config.request.display()))?;
    let request: ScanRequest = serde_json::from_str(&request_file)?;

    let tx = request.transaction()?;
    let mut db = BlockchainMemDB::new();
    for ring_transaction in request.ring_transactions()? {
        match db.add_transaction(ring_transaction) {
            Ok(_) | Err(blockchain_db::Error::Exists) => {}
            Err(error) => return Err(error.into()),
        }
    }
    info!("Loaded {} ring transactions", db.transaction_count());

    let account = load_account(config)?;
    let keys = ScanKeys::from_any(&account)?;
    let policy = config.identifier_config.input_match_policy;

    let mut identifier = ModularIdentifier::new(&tx)
        .with(Output::new(keys))
        .with(LegacyPaymentId::new(&keys))
        .with(IntegratedPaymentId::new(&keys))
        .with(GuessInput::new(keys, &db).with_policy(policy));
    if keys.spend_key.is_some() {
        identifier.push(Box::new(RealInput::new(keys, &db)?));
    } else {
        warn!("No spend key given, inputs are guessed only");
    }
    identifier.identify()?;

    let outputs = identifier.outputs().unwrap_or_default();
    for output in outputs {
        info!("Output: {}", output);
    }
    let guessed_inputs = identifier
        .inputs(IdentifierKind::GuessInput)
        .unwrap_or_default();
    let real_inputs = identifier.inputs(IdentifierKind::RealInput);
    for input in real_inputs.unwrap_or(guessed_inputs) {
        info!("Input: {}", input);
    }

    let report = Report {
        tx_hash: tx.get_hash().to_string(),
        fee: tx.fee(),
        outputs,
        outputs_total: calc_total(outputs),
        guessed_inputs,
        guessed_total: calc_total(guessed_inputs),
        real_inputs,
        real_total: real_inputs.map(calc_total),
        payment_id: identifier
            .payment_id(IdentifierKind::LegacyPaymentId)
            .or_else(|| identifier.payment_id(IdentifierKind::IntegratedPaymentId)),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
