use std::path::PathBuf;
use structopt::StructOpt;

/// Configuration for common systems
#[derive(StructOpt, Debug, Clone)]
#[structopt(rename_all = "kebab-case")]
pub struct Config {
    /// Sets the log level for the logger
    /// The levels correspond to the following:
    ///
    ///   0 - Warn
    ///   1 - Info
    ///   2 - Debug
    ///   3 - Trace
    #[structopt(long, default_value = "1")]
    pub log_level: u8,

    /// Sets the data directory to be used
    /// If unset, the default data directory is used
    #[structopt(long)]
    pub data_directory: Option<PathBuf>,
}

impl Config {
    /// The level filter matching `log_level`, `None` if out of range
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        match self.log_level {
            0 => Some(log::LevelFilter::Warn),
            1 => Some(log::LevelFilter::Info),
            2 => Some(log::LevelFilter::Debug),
            3 => Some(log::LevelFilter::Trace),
            _ => None,
        }
    }

    /// The configured data directory, or the user's default one
    pub fn data_directory(&self) -> Option<PathBuf> {
        if let Some(custom_data_directory) = &self.data_directory {
            return Some(custom_data_directory.to_path_buf());
        }
        directories::ProjectDirs::from("org", "Monero Tools", "tx-identify")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }
}
