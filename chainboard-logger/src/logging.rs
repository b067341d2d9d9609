use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// Filter directives, e.g. `"info"` or
    /// `"info,chainboard_connector=debug"`.
    pub directives: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required when `output` is `file`.
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directives: "info".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
        }
    }
}

pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.directives)
        .with_context(|| format!("invalid log filter directives: '{}'", config.directives))?;
    let subscriber = Registry::default().with(filter);

    match config.output {
        LogOutput::File => {
            let file_path = config.file_path.as_deref().ok_or_else(|| {
                anyhow::anyhow!("log output is 'file' but 'file-path' is not specified")
            })?;
            let log_file = File::create(file_path)?;
            match config.format {
                LogFormat::Json => subscriber
                    .with(fmt::layer().with_writer(log_file).with_ansi(false).json())
                    .init(),
                LogFormat::Plain => subscriber
                    .with(fmt::layer().with_writer(log_file).with_ansi(false))
                    .init(),
            }
        }
        LogOutput::Stdout => match config.format {
            LogFormat::Json => subscriber.with(fmt::layer().json()).init(),
            LogFormat::Plain => subscriber.with(fmt::layer().pretty()).init(),
        },
    }

    Ok(())
}
