//! log4rs setup.

use crate::error::{Error, Result};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

/// Line layout used when no config file is present.
pub const DEFAULT_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} | {l} | {t} | {m}{n}";

/// Initialise logging from `config_file` if it exists, else log to stdout at info.
pub fn init(config_file: &str) -> Result<()> {
    if Path::new(config_file).exists() {
        log4rs::init_file(config_file, Default::default())
            .map_err(|e| Error::Config(format!("{config_file}: {e}")))?;
        log::info!("Logging configured from {config_file}");
        return Ok(());
    }

    log4rs::init_config(default_config()?).map_err(|e| Error::Config(e.to_string()))?;
    log::info!("{config_file} not found, logging to stdout");
    Ok(())
}

fn default_config() -> Result<Config> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .map_err(|e| Error::Config(e.to_string()))
}
