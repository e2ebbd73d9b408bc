use log::LevelFilter;
use log4rs::Handle;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use thiserror::Error;

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}";
const CONSOLE_PATTERN: &str = "{h({l})} {m}{n}";

/// Sets up the global logger
///
/// # Arguments
///
/// * 'log_path' - optional path to a log file, appended to if it exists
/// * 'log_level' - level to log at
/// * 'log_to_stdout' - whether console output goes to stdout rather than stderr
pub fn setup_logger(log_path: Option<&str>, log_level: LevelFilter, log_to_stdout: bool) -> Result<Handle, LoggerError> {
    let config = build_log_config(log_path, log_level, log_to_stdout)?;
    let handle = log4rs::init_config(config)?;

    Ok(handle)
}

/// Builds the log4rs configuration without installing it
///
/// # Arguments
///
/// * 'log_path' - optional path to a log file
/// * 'log_level' - level to log at
/// * 'log_to_stdout' - console target selector
fn build_log_config(log_path: Option<&str>, log_level: LevelFilter, log_to_stdout: bool) -> Result<Config, LoggerError> {
    let target = if log_to_stdout { Target::Stdout } else { Target::Stderr };
    let console = ConsoleAppender::builder()
        .target(target)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
            .build(path)
            .map_err(|e| LoggerError::File(format!("{}: {}", path, e)))?;

        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    builder
        .build(root.build(log_level))
        .map_err(|e| LoggerError::Config(e.to_string()))
}

/// Error depicting errors that occur while setting up logging
///
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("FileError: {0}")]
    File(String),
    #[error("ConfigError: {0}")]
    Config(String),
    #[error("InitError: {0}")]
    Init(#[from] log::SetLoggerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_only_config_builds() {
        let config = build_log_config(None, LevelFilter::Debug, true).unwrap();

        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(config.appenders().len(), 1);
    }

    #[test]
    fn file_appender_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.log");
        let config = build_log_config(path.to_str(), LevelFilter::Info, false).unwrap();

        assert_eq!(config.appenders().len(), 2);
        assert_eq!(config.root().appenders(), ["console".to_string(), "file".to_string()]);
    }
}
