//! Deploys the static SVG NFT and mints one token from an SVG file.
use alloy::primitives::{Address, U256};
use deployer::{ContextCall, ContextSend, DeployedContract, EventExt as _};
use eyre::WrapErr;
use tracing::info;

use crate::{abi::SVGNFT, error::ProtocolMismatch, harness::Harness};

/// Result of [`deploy_and_mint`].
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMint {
    /// `SVGNFT` record.
    pub contract: DeployedContract,
    /// Token minted for the SVG.
    pub token_id: U256,
    /// Data URI returned by `tokenURI`.
    pub token_uri: String,
}

/// Deploy `SVGNFT` and mint the configured SVG.
///
/// # Errors
///
/// May fail if the SVG can't be read, the deployment or `create` reverts,
/// or the mint is missing its `Transfer` event.
pub async fn deploy_and_mint(harness: &Harness) -> eyre::Result<StaticMint> {
    let contract = harness.deployer.contract("SVGNFT").deploy().await?;
    info!(
        "verify with: forge verify-contract --chain {} {} SVGNFT",
        harness.profile.name, contract.address
    );

    let svg_path = &harness.config.svg_path;
    let svg = tokio::fs::read_to_string(svg_path)
        .await
        .wrap_err(format!("failed to read SVG at {}", svg_path.display()))?;

    let nft = SVGNFT::new(contract.address, harness.account.wallet.clone());
    let receipt = nft.create(svg).ctx_send("create SVG NFT").await?;

    let transfers: Vec<SVGNFT::Transfer> = receipt.events();
    let token_id = transfers
        .into_iter()
        .find(|event| event.from == Address::ZERO)
        .map(|event| event.tokenId)
        .ok_or_else(|| ProtocolMismatch {
            step: "create SVG NFT",
            detail: "no mint Transfer in receipt".to_owned(),
        })?;
    info!(%token_id, "minted SVG NFT");

    let token_uri = nft.tokenURI(token_id).ctx_call("tokenURI").await?;
    info!(%token_uri, "view the token URI");

    Ok(StaticMint { contract, token_id, token_uri })
}
