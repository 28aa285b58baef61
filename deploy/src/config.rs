//! Run configuration loaded from environment variables.
//!
//! Every variable is optional: `RPC_URL`, `PRIVATE_KEY`, `ARTIFACTS_DIR`,
//! `DEPLOYMENTS_DIR`, `SVG_PATH`, `NETWORKS_CONFIG`,
//! `SUBSCRIPTION_TIMEOUT_SECS`, `RANDOMNESS_TIMEOUT_SECS`.
use std::{path::PathBuf, time::Duration};

use deployer::DEFAULT_RPC_URL;

use crate::error::ConfigError;

/// How long a local run waits for the mock's `SubscriptionCreated` event.
pub const DEFAULT_SUBSCRIPTION_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a public run waits for the oracle to fulfill randomness.
pub const DEFAULT_RANDOMNESS_TIMEOUT: Duration = Duration::from_secs(3000);

/// Configuration of a deployment run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// JSON-RPC endpoint of the target chain.
    pub rpc_url: String,
    /// Deployer key. Development chains default to the node's funded key.
    pub private_key: Option<String>,
    /// Directory holding compiled contract artifacts.
    pub artifacts_dir: PathBuf,
    /// Root of the deployment registry.
    pub deployments_dir: PathBuf,
    /// SVG minted by the static NFT.
    pub svg_path: PathBuf,
    /// Optional TOML file extending the network table.
    pub networks_config: Option<PathBuf>,
    /// Upper bound on waiting for the subscription id (local chains).
    pub subscription_timeout: Duration,
    /// Upper bound on waiting for randomness (public chains).
    pub randomness_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            private_key: None,
            artifacts_dir: PathBuf::from("artifacts"),
            deployments_dir: PathBuf::from("deployments"),
            svg_path: PathBuf::from("img/polygon.svg"),
            networks_config: None,
            subscription_timeout: DEFAULT_SUBSCRIPTION_TIMEOUT,
            randomness_timeout: DEFAULT_RANDOMNESS_TIMEOUT,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::InvalidValue`] if a timeout is not a whole
    /// number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`HarnessConfig::from_env`].
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let path = |name: &str, default: PathBuf| {
            lookup(name).map_or(default, PathBuf::from)
        };
        let secs = |name: &str, default: Duration| match lookup(name) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    name: name.to_owned(),
                    value,
                }),
        };

        Ok(Self {
            rpc_url: lookup("RPC_URL").unwrap_or(defaults.rpc_url),
            private_key: lookup("PRIVATE_KEY").filter(|key| !key.is_empty()),
            artifacts_dir: path("ARTIFACTS_DIR", defaults.artifacts_dir),
            deployments_dir: path("DEPLOYMENTS_DIR", defaults.deployments_dir),
            svg_path: path("SVG_PATH", defaults.svg_path),
            networks_config: lookup("NETWORKS_CONFIG").map(PathBuf::from),
            subscription_timeout: secs(
                "SUBSCRIPTION_TIMEOUT_SECS",
                defaults.subscription_timeout,
            )?,
            randomness_timeout: secs(
                "RANDOMNESS_TIMEOUT_SECS",
                defaults.randomness_timeout,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<HarnessConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        HarnessConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_target_a_local_node() {
        let config = config(&[]).unwrap();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.private_key, None);
        assert_eq!(config.randomness_timeout, Duration::from_secs(3000));
        assert_eq!(config.svg_path, PathBuf::from("img/polygon.svg"));
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("RPC_URL", "https://rpc.sepolia.org"),
            ("PRIVATE_KEY", ""),
            ("DEPLOYMENTS_DIR", "/tmp/deployments"),
            ("RANDOMNESS_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.rpc_url, "https://rpc.sepolia.org");
        assert_eq!(config.private_key, None);
        assert_eq!(config.deployments_dir, PathBuf::from("/tmp/deployments"));
        assert_eq!(config.randomness_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_malformed_timeouts() {
        let err = config(&[("SUBSCRIPTION_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "SUBSCRIPTION_TIMEOUT_SECS".to_owned(),
                value: "soon".to_owned(),
            }
        );
    }
}
