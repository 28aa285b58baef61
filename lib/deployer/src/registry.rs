use std::path::{Path, PathBuf};

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, TxHash, B256},
};
use eyre::{ContextCompat, WrapErr};
use serde::{Deserialize, Serialize};

/// A contract deployed on a given network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    /// Contract name, as used for its artifact.
    pub name: String,
    /// Address the contract lives at.
    pub address: Address,
    /// Interface descriptor of the deployed code.
    pub abi: JsonAbi,
    /// Hash of the deployment transaction.
    pub transaction_hash: Option<TxHash>,
    /// Keccak-256 of the creation bytecode and constructor arguments.
    ///
    /// Redeploying is skipped when this matches.
    pub init_code_hash: B256,
}

impl DeployedContract {
    /// Whether this record was deployed from init code hashing to
    /// `init_code_hash`.
    #[must_use]
    pub fn deployed_from(&self, init_code_hash: B256) -> bool {
        self.init_code_hash == init_code_hash
    }
}

/// Per-network store of [`DeployedContract`] records.
///
/// Records live at `<root>/<network>/<name>.json`.
#[derive(Clone, Debug)]
pub struct Registry {
    dir: PathBuf,
}

impl Registry {
    /// Registry for `network` rooted at `root`.
    pub fn new(root: impl AsRef<Path>, network: &str) -> Self {
        Self { dir: root.as_ref().join(network) }
    }

    /// Directory holding this network's records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Look up contract `name`.
    ///
    /// # Errors
    ///
    /// May fail if a record exists but can't be read or parsed.
    pub fn get(&self, name: &str) -> eyre::Result<Option<DeployedContract>> {
        let path = self.record_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)
            .wrap_err(format!("failed to read {}", path.display()))?;
        let record = serde_json::from_str(&json)
            .wrap_err(format!("corrupted deployment {}", path.display()))?;
        Ok(Some(record))
    }

    /// Look up contract `name`, failing when it was never deployed.
    ///
    /// # Errors
    ///
    /// May fail if there is no record for `name`.
    pub fn require(&self, name: &str) -> eyre::Result<DeployedContract> {
        self.get(name)?.context(format!(
            "no deployment found for {name} in {}",
            self.dir.display()
        ))
    }

    /// Persist `record`, replacing any previous record with the same name.
    ///
    /// # Errors
    ///
    /// May fail if the registry directory is not writable.
    pub fn save(&self, record: &DeployedContract) -> eyre::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .wrap_err(format!("failed to create {}", self.dir.display()))?;
        let path = self.record_path(&record.name);
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)
            .wrap_err(format!("failed to write {}", path.display()))
    }

    /// Drop every record of this network, so the next run deploys from
    /// scratch.
    ///
    /// # Errors
    ///
    /// May fail if the registry directory can't be removed.
    pub fn reset(&self) -> eyre::Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)
                .wrap_err(format!("failed to reset {}", self.dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    fn temp_registry(network: &str) -> Registry {
        let root = std::env::temp_dir()
            .join(format!("deployments-{}", rand::random::<u64>()));
        Registry::new(root, network)
    }

    fn record(name: &str) -> DeployedContract {
        DeployedContract {
            name: name.to_owned(),
            address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            abi: JsonAbi::default(),
            transaction_hash: None,
            init_code_hash: b256!(
                "0x6c3699283bda56ad74f6b855546325b68d482e983852a7a82979cc4807b641f4"
            ),
        }
    }

    #[test]
    fn stores_records_per_network() {
        let registry = temp_registry("localhost");
        assert_eq!(registry.get("LinkToken").unwrap(), None);

        registry.save(&record("LinkToken")).unwrap();
        assert_eq!(registry.get("LinkToken").unwrap(), Some(record("LinkToken")));
        assert!(registry.dir().ends_with("localhost"));

        let other = Registry::new(registry.dir().parent().unwrap(), "sepolia");
        assert_eq!(other.get("LinkToken").unwrap(), None);

        registry.reset().unwrap();
    }

    #[test]
    fn reset_forgets_every_record() {
        let registry = temp_registry("hardhat");
        registry.save(&record("LinkToken")).unwrap();
        registry.save(&record("VRFCoordinatorV2Mock")).unwrap();

        registry.reset().unwrap();

        assert_eq!(registry.get("LinkToken").unwrap(), None);
        let err = registry.require("VRFCoordinatorV2Mock").unwrap_err();
        assert!(err.to_string().contains("no deployment found"));
        // Resetting an empty registry is fine.
        registry.reset().unwrap();
    }

    #[test]
    fn reuse_requires_matching_init_code() {
        let record = record("RandomSVG");
        assert!(record.deployed_from(record.init_code_hash));
        assert!(!record.deployed_from(B256::ZERO));
    }
}
