use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::Network;

/// Environment variable selecting the network when no flag is given.
pub const NETWORK_ENV: &str = "DONATIONS_NETWORK";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DONATIONS_DATA_DIR";

const DATA_DIR_NAME: &str = ".responsive-donations";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {source_name} network value: {value}")]
    InvalidNetwork { source_name: &'static str, value: String },

    #[error("Poll interval must be at least one second")]
    PollInterval,
}

/// Startup configuration for the app shell.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Explicit network choice from the command line or environment.
    /// `None` defers to the persisted config, then localnet.
    pub network: Option<Network>,
    /// Node endpoint override; defaults to the network's own URL.
    pub node_url: Option<String>,
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            network: None,
            node_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AppConfig {
    /// Merge command-line values over the environment.
    ///
    /// The environment is read once here and nowhere else.
    pub fn from_sources(
        cli_network: Option<&str>,
        data_dir: Option<PathBuf>,
        node_url: Option<String>,
        poll_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let env_network = std::env::var(NETWORK_ENV).ok();
        let network = resolve_network(cli_network, env_network.as_deref())?;

        let poll_interval = match poll_secs {
            Some(0) => return Err(ConfigError::PollInterval),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            data_dir: data_dir.unwrap_or_else(default_data_dir),
            network,
            node_url,
            poll_interval,
        })
    }
}

/// Flag first, then environment. Blank values count as absent.
pub fn resolve_network(
    cli: Option<&str>,
    env: Option<&str>,
) -> Result<Option<Network>, ConfigError> {
    let candidates = [("--network", cli), (NETWORK_ENV, env)];
    for (source_name, value) in candidates {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        return value
            .parse::<Network>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNetwork {
                source_name,
                value: value.to_string(),
            });
    }
    Ok(None)
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_environment() {
        assert_eq!(
            resolve_network(Some("testnet"), Some("mainnet")).unwrap(),
            Some(Network::TestNet)
        );
        assert_eq!(
            resolve_network(None, Some("mainnet")).unwrap(),
            Some(Network::MainNet)
        );
        assert_eq!(resolve_network(Some("  "), None).unwrap(), None);
    }

    #[test]
    fn bad_values_name_their_source() {
        let err = resolve_network(None, Some("moonnet")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid DONATIONS_NETWORK network value: moonnet"
        );
    }

    #[test]
    fn zero_poll_interval_rejected() {
        assert!(matches!(
            AppConfig::from_sources(Some("localnet"), None, None, Some(0)),
            Err(ConfigError::PollInterval)
        ));
    }
}
