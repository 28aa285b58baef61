//! `random-svg-deploy [TAG...]`: runs the deploy scripts selected by the
//! given tags (`all`, `mocks`, `svg`, `rsvg`, `main`) against `RPC_URL`.
use eyre::WrapErr;
use random_svg_deploy::{
    config::HarnessConfig,
    harness::{Harness, Tag},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,alloy=warn")),
        )
        .init();

    let tags = std::env::args()
        .skip(1)
        .map(|tag| tag.parse::<Tag>())
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("usage: random-svg-deploy [all|mocks|svg|rsvg|main]...")?;

    let config = HarnessConfig::from_env()?;
    let harness = Harness::connect(config).await?;
    let report = harness.run(&tags).await?;

    if let Some(mint) = &report.static_mint {
        info!(address = %mint.contract.address, token_id = %mint.token_id, "SVGNFT ready");
    }
    if let Some(mint) = &report.random_mint {
        info!(
            address = %mint.contract.address,
            token_id = %mint.request.token_id,
            owner = %mint.owner,
            "RandomSVG ready"
        );
    }
    Ok(())
}
