use std::path::PathBuf;

use structopt::StructOpt;

use bin_common::Config as BinCommonConfig;
use transaction_util::NetworkType;
use tx_identifier::Config as IdentifierConfig;

#[derive(StructOpt, Debug)]
#[structopt(rename_all = "kebab-case", name = "tx-identify")]
pub struct Config {
    /// Network the address belongs to (mainnet, testnet or stagenet)
    #[structopt(long, default_value = "mainnet")]
    pub network: NetworkType,

    /// Primary address or subaddress to identify transactions for
    #[structopt(long)]
    pub address: String,

    /// Secret view key in hex
    #[structopt(long, default_value = "")]
    pub viewkey: String,

    /// Secret spend key in hex. Enables exact input identification
    #[structopt(long, default_value = "")]
    pub spendkey: String,

    /// JSON file holding the transaction and the transactions its rings refer to
    #[structopt(long)]
    pub request: PathBuf,

    /// Generate the whole subaddress window before scanning
    #[structopt(long)]
    pub populate_subaddresses: bool,

    #[structopt(flatten)]
    pub identifier_config: IdentifierConfig,

    #[structopt(flatten)]
    pub bin_common_config: BinCommonConfig,
}
