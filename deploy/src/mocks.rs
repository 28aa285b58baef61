//! Mock LINK token and VRF coordinator for development chains.
use alloy::{
    primitives::{aliases::U96, uint, U256},
    sol_types::SolConstructor,
};
use deployer::DeployedContract;
use eyre::bail;
use tracing::info;

use crate::{
    abi::{VRFCoordinatorV2Mock, VrfCoordinatorMock},
    harness::Harness,
};

/// Flat LINK fee the mock charges per request (0.1 LINK).
pub const BASE_FEE: U256 = uint!(100_000_000_000_000_000_U256);

/// LINK per gas the mock charges for the callback.
pub const GAS_PRICE_LINK: U256 = uint!(1_000_000_000_U256);

/// Mock oracle infrastructure deployed on a development chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Mocks {
    /// `LinkToken` record.
    pub link_token: DeployedContract,
    /// `VRFCoordinatorV2Mock` record.
    pub vrf_coordinator: DeployedContract,
}

impl Mocks {
    /// Binding to the mock coordinator through `harness`'s wallet.
    #[must_use]
    pub fn coordinator(&self, harness: &Harness) -> VrfCoordinatorMock {
        VRFCoordinatorV2Mock::new(
            self.vrf_coordinator.address,
            harness.account.wallet.clone(),
        )
    }
}

/// Deploy the mocks if `harness` targets a development chain.
///
/// Returns `None` on public networks. Rerunning against the same registry
/// reuses existing deployments.
///
/// # Errors
///
/// May fail if an artifact is missing or a deployment reverts.
pub async fn deploy_mocks(harness: &Harness) -> eyre::Result<Option<Mocks>> {
    if !harness.profile.is_development() {
        return Ok(None);
    }
    info!(network = %harness.profile.name, "local network detected, deploying mocks");

    let link_token = harness.deployer.contract("LinkToken").deploy().await?;

    let ctr = VRFCoordinatorV2Mock::constructorCall {
        baseFee: to_u96(BASE_FEE, "base fee")?,
        gasPriceLink: to_u96(GAS_PRICE_LINK, "gas price link")?,
    }
    .abi_encode();
    let vrf_coordinator = harness
        .deployer
        .contract("VRFCoordinatorV2Mock")
        .with_constructor(ctr)
        .deploy()
        .await?;

    info!(
        link_token = %link_token.address,
        vrf_coordinator = %vrf_coordinator.address,
        "mocks deployed"
    );
    Ok(Some(Mocks { link_token, vrf_coordinator }))
}

/// Narrow `value` to a `uint96` argument.
pub(crate) fn to_u96(value: U256, name: &str) -> eyre::Result<U96> {
    if value.bit_len() > 96 {
        bail!("{name} {value} does not fit in uint96");
    }
    Ok(U96::from(value))
}
