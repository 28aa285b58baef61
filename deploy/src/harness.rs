//! Connection to the target chain and the deploy scripts run against it.
use std::{fmt, str::FromStr};

use alloy::{
    providers::{Provider, ProviderBuilder},
    transports::http::reqwest::Url,
};
use deployer::{Account, Deployer, Registry};
use eyre::WrapErr;
use tracing::info;

use crate::{
    config::HarnessConfig,
    error::ConfigError,
    mocks::{self, Mocks},
    network::{NetworkProfile, NetworkTable},
    random_svg::{self, RandomMintReport},
    svg_nft::{self, StaticMint},
};

/// Selects which deploy scripts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Every script.
    All,
    /// Mock infrastructure only.
    Mocks,
    /// Static SVG NFT, after the mocks.
    Svg,
    /// Random SVG NFT, after the mocks.
    Rsvg,
    /// Mocks and the static SVG NFT.
    Main,
}

impl FromStr for Tag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "mocks" => Ok(Self::Mocks),
            "svg" => Ok(Self::Svg),
            "rsvg" => Ok(Self::Rsvg),
            "main" => Ok(Self::Main),
            _ => Err(ConfigError::InvalidValue {
                name: "tag".to_owned(),
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::All => "all",
            Self::Mocks => "mocks",
            Self::Svg => "svg",
            Self::Rsvg => "rsvg",
            Self::Main => "main",
        };
        f.write_str(tag)
    }
}

/// Scripts selected by a set of tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scripts {
    /// Deploy the mocks.
    pub mocks: bool,
    /// Deploy and mint the static SVG NFT.
    pub svg: bool,
    /// Deploy and mint the Random SVG NFT.
    pub rsvg: bool,
}

impl Scripts {
    /// Scripts to run for `tags`. No tags means [`Tag::All`].
    #[must_use]
    pub fn select(tags: &[Tag]) -> Self {
        if tags.is_empty() {
            return Self::select(&[Tag::All]);
        }
        let has = |wanted: &[Tag]| tags.iter().any(|tag| wanted.contains(tag));
        Self {
            mocks: true,
            svg: has(&[Tag::All, Tag::Svg, Tag::Main]),
            rsvg: has(&[Tag::All, Tag::Rsvg]),
        }
    }
}

/// What a [`Harness::run`] deployed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Mocks, on development chains.
    pub mocks: Option<Mocks>,
    /// Static SVG NFT mint, if selected.
    pub static_mint: Option<StaticMint>,
    /// Random SVG NFT mint, if selected.
    pub random_mint: Option<RandomMintReport>,
}

/// A deployer account connected to one network.
pub struct Harness {
    /// Run configuration.
    pub config: HarnessConfig,
    /// Parameters of the connected network.
    pub profile: NetworkProfile,
    /// Account sending every transaction.
    pub account: Account,
    /// Deployer recording into `<deployments_dir>/<network>`.
    pub deployer: Deployer,
}

impl Harness {
    /// Connect to `config.rpc_url` and resolve its network.
    ///
    /// Without `PRIVATE_KEY`, development chains use the node's pre-funded
    /// account.
    ///
    /// # Errors
    ///
    /// May fail if the endpoint is unreachable, the network table can't be
    /// loaded, or a public network has no private key.
    pub async fn connect(config: HarnessConfig) -> eyre::Result<Self> {
        let rpc_url: Url = config
            .rpc_url
            .parse()
            .wrap_err(format!("failed to parse {} into a URL", config.rpc_url))?;
        let chain_id = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .get_chain_id()
            .await
            .wrap_err("failed to get chain id")?;
        let profile = resolve_profile(&config, chain_id)?;

        let account = deployer_account(&config, &profile, rpc_url)?;
        Ok(Self::assemble(config, profile, account))
    }

    /// Use `account` on whatever network its wallet is connected to.
    ///
    /// # Errors
    ///
    /// May fail if the chain id can't be read or the network table can't be
    /// loaded.
    pub async fn with_account(
        config: HarnessConfig,
        account: Account,
    ) -> eyre::Result<Self> {
        let chain_id = account
            .wallet
            .get_chain_id()
            .await
            .wrap_err("failed to get chain id")?;
        let profile = resolve_profile(&config, chain_id)?;
        Ok(Self::assemble(config, profile, account))
    }

    fn assemble(
        config: HarnessConfig,
        profile: NetworkProfile,
        account: Account,
    ) -> Self {
        let registry = Registry::new(&config.deployments_dir, &profile.name);
        let deployer = Deployer::new(
            account.wallet.clone(),
            registry,
            config.artifacts_dir.clone(),
        );
        Self { config, profile, account, deployer }
    }

    /// Run the scripts selected by `tags`: mocks, then the static NFT,
    /// then the Random SVG NFT.
    ///
    /// # Errors
    ///
    /// Stops at the first failing script.
    pub async fn run(&self, tags: &[Tag]) -> eyre::Result<RunReport> {
        let scripts = Scripts::select(tags);
        info!(
            network = %self.profile.name,
            chain_id = ?self.profile.chain_id,
            deployer = %self.account.address(),
            ?scripts,
            "starting deployment"
        );

        let mut report = RunReport::default();
        if scripts.mocks {
            report.mocks = mocks::deploy_mocks(self).await?;
        }
        if scripts.svg {
            report.static_mint = Some(svg_nft::deploy_and_mint(self).await?);
        }
        if scripts.rsvg {
            report.random_mint =
                Some(random_svg::run(self, report.mocks.as_ref()).await?);
        }
        Ok(report)
    }
}

fn deployer_account(
    config: &HarnessConfig,
    profile: &NetworkProfile,
    rpc_url: Url,
) -> eyre::Result<Account> {
    match &config.private_key {
        Some(key) => Account::from_private_key(key, rpc_url),
        None if profile.is_development() => Account::dev(rpc_url),
        None => Err(ConfigError::MissingPrivateKey {
            network: profile.name.clone(),
        }
        .into()),
    }
}

fn resolve_profile(
    config: &HarnessConfig,
    chain_id: u64,
) -> eyre::Result<NetworkProfile> {
    let table = NetworkTable::load(config.networks_config.as_deref())?;
    let profile = table.resolve(chain_id)?;
    info!(chain_id, network = %profile.name, "resolved network");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_url() -> Url {
        deployer::DEFAULT_RPC_URL.parse().unwrap()
    }

    #[test]
    fn dev_key_is_used_only_on_the_local_chain() {
        let config = HarnessConfig::default();
        let local = crate::network::resolve(crate::network::LOCAL_CHAIN_ID).unwrap();
        let account = deployer_account(&config, &local, local_url()).unwrap();
        assert_eq!(account.address(), Account::dev(local_url()).unwrap().address());

        let unknown = crate::network::resolve(11_155_111).unwrap();
        let err = deployer_account(&config, &unknown, local_url()).err().unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingPrivateKey { network: "hardhat".to_owned() })
        );
    }

    #[test]
    fn explicit_key_is_used_on_public_chains() {
        let config = HarnessConfig {
            private_key: Some(
                "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
                    .to_owned(),
            ),
            ..HarnessConfig::default()
        };
        let mainnet = crate::network::resolve(1).unwrap();
        let account = deployer_account(&config, &mainnet, local_url()).unwrap();
        assert_eq!(
            account.address(),
            alloy::primitives::address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn parses_known_tags() {
        let tags: Vec<Tag> = ["all", "mocks", "svg", "rsvg", "main"]
            .iter()
            .map(|tag| tag.parse().unwrap())
            .collect();
        assert_eq!(tags, [Tag::All, Tag::Mocks, Tag::Svg, Tag::Rsvg, Tag::Main]);
        assert_eq!(Tag::Rsvg.to_string(), "rsvg");
    }

    #[test]
    fn rejects_unknown_tag() {
        assert_eq!(
            "nft".parse::<Tag>(),
            Err(ConfigError::InvalidValue {
                name: "tag".to_owned(),
                value: "nft".to_owned(),
            })
        );
    }

    #[test]
    fn no_tags_runs_everything() {
        let all = Scripts { mocks: true, svg: true, rsvg: true };
        assert_eq!(Scripts::select(&[]), all);
        assert_eq!(Scripts::select(&[Tag::All]), all);
    }

    #[test]
    fn every_tag_includes_mocks() {
        assert_eq!(
            Scripts::select(&[Tag::Mocks]),
            Scripts { mocks: true, svg: false, rsvg: false }
        );
        assert_eq!(
            Scripts::select(&[Tag::Svg]),
            Scripts { mocks: true, svg: true, rsvg: false }
        );
        assert_eq!(
            Scripts::select(&[Tag::Rsvg]),
            Scripts { mocks: true, svg: false, rsvg: true }
        );
        assert_eq!(
            Scripts::select(&[Tag::Main, Tag::Rsvg]),
            Scripts { mocks: true, svg: true, rsvg: true }
        );
    }
}
