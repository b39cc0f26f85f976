#![deny(missing_docs)]

//! Command line options and logging setup shared by the binaries

mod config;
mod logger;

pub use config::Config;
pub use logger::{init as init_logging, Error as LoggingError};
