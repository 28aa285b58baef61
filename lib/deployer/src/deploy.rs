use std::path::PathBuf;

use alloy::{
    network::TransactionBuilder,
    primitives::{keccak256, Address, Bytes},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use eyre::WrapErr;
use tracing::info;

use crate::{
    artifact::Artifact,
    error::TransactionFailed,
    receipt::Ext as _,
    registry::{DeployedContract, Registry},
    system::Wallet,
};

/// Deploys artifacts on behalf of one wallet and records them in a
/// [`Registry`].
#[derive(Clone)]
pub struct Deployer {
    wallet: Wallet,
    registry: Registry,
    artifacts_dir: PathBuf,
}

impl Deployer {
    /// Create a deployer sending transactions through `wallet`.
    pub fn new(
        wallet: Wallet,
        registry: Registry,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { wallet, registry, artifacts_dir: artifacts_dir.into() }
    }

    /// Registry the deployments are recorded in.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start configuring the deployment of contract `name`.
    #[must_use]
    pub fn contract<'a>(&'a self, name: &'a str) -> Deployment<'a> {
        Deployment { deployer: self, name, ctr_args: None, reuse: true }
    }
}

/// A single pending deployment, built with [`Deployer::contract`].
#[must_use]
pub struct Deployment<'a> {
    deployer: &'a Deployer,
    name: &'a str,
    ctr_args: Option<Bytes>,
    reuse: bool,
}

impl Deployment<'_> {
    /// Add ABI-encoded solidity constructor arguments.
    pub fn with_constructor(mut self, ctr_args: impl Into<Bytes>) -> Self {
        self.ctr_args = Some(ctr_args.into());
        self
    }

    /// Always send a new deployment, ignoring any recorded one.
    ///
    /// Needed for contracts whose constructor has side effects the caller
    /// waits on.
    pub fn fresh(mut self) -> Self {
        self.reuse = false;
        self
    }

    /// Deploy the contract, or reuse a previous deployment of the same
    /// bytecode and constructor arguments that still has code on chain.
    ///
    /// # Errors
    ///
    /// May error if:
    ///
    /// - The artifact can't be loaded.
    /// - The registry can't be read or written.
    /// - The deployment transaction fails or reverts.
    pub async fn deploy(self) -> eyre::Result<DeployedContract> {
        let name = self.name;
        let artifact = Artifact::load(&self.deployer.artifacts_dir, name)?;
        let mut init_code = artifact.bytecode.to_vec();
        if let Some(ctr_args) = &self.ctr_args {
            init_code.extend_from_slice(ctr_args);
        }
        let init_code_hash = keccak256(&init_code);

        let existing =
            if self.reuse { self.deployer.registry.get(name)? } else { None };
        if let Some(existing) = existing {
            if existing.deployed_from(init_code_hash)
                && self.has_code(existing.address).await?
            {
                info!(contract = name, address = %existing.address, "reusing deployment");
                return Ok(existing);
            }
        }

        let tx = TransactionRequest::default().with_deploy_code(init_code);
        let step = format!("deploy {name}");
        let receipt = self
            .deployer
            .wallet
            .send_transaction(tx)
            .await
            .map_err(|e| {
                eyre::Report::new(e).wrap_err(TransactionFailed {
                    step: step.clone(),
                    tx_hash: None,
                })
            })?
            .get_receipt()
            .await
            .wrap_err(format!("{step}: receipt not available"))?;
        receipt.ensure_success(&step)?;
        let address = receipt.address()?;

        let record = DeployedContract {
            name: name.to_owned(),
            address,
            abi: artifact.abi,
            transaction_hash: Some(receipt.transaction_hash),
            init_code_hash,
        };
        self.deployer.registry.save(&record)?;

        info!(
            contract = name,
            %address,
            tx = %receipt.transaction_hash,
            gas_used = receipt.gas_used,
            "deployed contract"
        );
        Ok(record)
    }

    async fn has_code(&self, address: Address) -> eyre::Result<bool> {
        let code = self
            .deployer
            .wallet
            .get_code_at(address)
            .await
            .wrap_err(format!("failed to get code at {address}"))?;
        Ok(!code.is_empty())
    }
}
