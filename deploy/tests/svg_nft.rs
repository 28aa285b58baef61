#![cfg(feature = "e2e")]

use std::path::{Path, PathBuf};

use alloy::primitives::U256;
use deployer::{Account, ContextCall};
use eyre::Result;
use random_svg_deploy::{
    abi::SVGNFT,
    config::HarnessConfig,
    harness::{Harness, Tag},
    svg_nft,
};

fn config() -> HarnessConfig {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let artifacts_dir = std::env::var("ARTIFACTS_DIR")
        .map_or_else(|_| root.join("artifacts"), PathBuf::from);
    HarnessConfig {
        artifacts_dir,
        deployments_dir: std::env::temp_dir()
            .join(format!("svg-nft-{}", rand::random::<u64>())),
        svg_path: root.join("img/polygon.svg"),
        ..HarnessConfig::default()
    }
}

#[deployer::test]
async fn mints_token_zero_to_deployer(alice: Account) -> Result<()> {
    let harness = Harness::with_account(config(), alice.clone()).await?;
    let minted = svg_nft::deploy_and_mint(&harness).await?;

    assert_eq!(minted.token_id, U256::ZERO);
    assert!(!minted.token_uri.is_empty());

    let nft = SVGNFT::new(minted.contract.address, alice.wallet.clone());
    let owner = nft.ownerOf(U256::ZERO).ctx_call("ownerOf").await?;
    assert_eq!(owner, alice.address());
    Ok(())
}

#[deployer::test]
async fn svg_tag_deploys_mocks_and_nft(alice: Account) -> Result<()> {
    let harness = Harness::with_account(config(), alice).await?;
    let report = harness.run(&[Tag::Svg]).await?;

    assert!(report.mocks.is_some());
    assert!(report.random_mint.is_none());
    let minted = report.static_mint.expect("svg tag should mint");
    assert!(minted.token_uri.starts_with("data:"));
    assert!(harness.deployer.registry().get("SVGNFT")?.is_some());
    Ok(())
}

#[deployer::test]
async fn missing_svg_fails_before_minting(alice: Account) -> Result<()> {
    let config = HarnessConfig {
        svg_path: PathBuf::from("img/does-not-exist.svg"),
        ..config()
    };
    let harness = Harness::with_account(config, alice).await?;

    let err = svg_nft::deploy_and_mint(&harness).await.unwrap_err();
    assert!(err.to_string().contains("failed to read SVG"));
    Ok(())
}
