use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The top-level configuration for the `chainboard-connector` library.
///
/// Aggregates feed behavior and internal channel sizing. Typically
/// deserialized from a TOML file via [`load_config`] and passed to the
/// `SyncEngine` on construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectorConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
}

/// Behavior of the feed synchronizer and its background workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedConfig {
    /// Records fetched per `load_next_page` call. Fixed for the session.
    pub page_size: u64,
    /// Interval at which the poll worker re-reads the total record count.
    pub poll_interval_secs: u64,
    /// Delay before the "is the wallet prompt hidden?" hint is shown during
    /// an interactive connect. Status text only; does not abort the request.
    pub connect_hint_secs: u64,
}

/// Capacities for the MPSC channels inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelConfig {
    /// Buffer for commands sent through the `SyncEngineHandle`.
    pub command_buffer: usize,
    /// Buffer for poll observations flowing into the engine loop.
    pub observation_buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            poll_interval_secs: 5,
            connect_hint_secs: 3,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            observation_buffer: 16,
        }
    }
}

/// Loads the connector configuration from a TOML file, with
/// `CHAINBOARD`-prefixed environment variables layered on top.
pub fn load_config(path: &str) -> Result<ConnectorConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("CHAINBOARD").separator("__"));

    let settings: ConnectorConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}
