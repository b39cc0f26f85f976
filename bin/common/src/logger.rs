use fern::colors::Color;
use log::info;

use crate::Config;

/// Errors raised while setting up logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured log level is not one of 0 to 3
    #[error("Invalid log level {0}")]
    InvalidLogLevel(u8),

    /// No data directory was configured and the user has no home directory
    #[error("Failed to get project user directory")]
    NoDataDirectory,

    /// The log directory could not be created
    #[error("Unexpected error when creating log directory: {0}")]
    Io(#[from] std::io::Error),

    /// The logger could not be installed
    #[error(transparent)]
    Init(#[from] fern::InitError),
}

/// Logs to stdout and to `<data directory>/<binary_name>.log`
pub fn init(config: &Config, binary_name: &str) -> Result<(), Error> {
    let colors = fern::colors::ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Cyan)
        .debug(Color::Green)
        .trace(Color::Magenta);

    let log_level = config
        .level_filter()
        .ok_or(Error::InvalidLogLevel(config.log_level))?;

    let mut log_file_path = config.data_directory().ok_or(Error::NoDataDirectory)?;

    if let Err(err) = std::fs::create_dir_all(&log_file_path) {
        if err.kind() != std::io::ErrorKind::AlreadyExists {
            return Err(err.into());
        }
    }

    log_file_path.push(binary_name);
    log_file_path.set_extension("log");

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{date}][{target}][{level}{color_line}]\t{message}\x1B[0m",
                color_line = format_args!("\x1B[{}m", colors.get_color(&record.level()).to_fg_str()),
                date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                target = record.target(),
                level = colors.color(record.level()),
                message = message,
            ))
        })
        .level(log_level)
        .chain(std::io::stdout())
        .chain(fern::log_file(&log_file_path)?)
        .apply()
        .map_err(fern::InitError::from)?;

    info!("Logging events to {}", log_file_path.display());
    Ok(())
}
