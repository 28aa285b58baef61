//! Per-chain deployment parameters.
//!
//! The built-in table covers local development chains and the public
//! networks the Random SVG NFT was deployed to. A TOML file can add or
//! override entries:
//!
//! ```toml
//! [11155111]
//! name = "sepolia"
//! vrf_coordinator = "0x8103B0A8A00be2DDC778e6e7eaa21791Cd364625"
//! link_token = "0x779877A7B0D9E8603169DdbD7836e478b4624789"
//! key_hash = "0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"
//! fund_amount = "0x8ac7230489e80000"
//! ```
use std::{collections::BTreeMap, path::Path};

use alloy::primitives::{address, b256, uint, Address, B256, U256};
use eyre::WrapErr;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::ConfigError;

/// Network names that get mock oracle infrastructure when no chain id is
/// known.
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["hardhat", "localhost"];

/// Chain id of Hardhat and Anvil nodes.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Key of the fallback entry in the network table.
const DEFAULT_KEY: &str = "default";

const TEN_LINK: U256 = uint!(10_000_000_000_000_000_000_U256);
const LOCAL_KEY_HASH: B256 =
    b256!("0x6c3699283bda56ad74f6b855546325b68d482e983852a7a82979cc4807b641f4");

/// Deployment parameters of one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    /// Chain the profile was resolved for.
    pub chain_id: Option<u64>,
    /// Human readable network name. Also names the registry directory.
    pub name: String,
    /// VRF coordinator address. Absent on development chains.
    pub vrf_coordinator: Option<Address>,
    /// LINK token address. Absent on development chains.
    pub link_token: Option<Address>,
    /// Gas lane key hash used for randomness requests.
    pub key_hash: B256,
    /// Amount of LINK sent to the consumer and its subscription.
    pub fund_amount: U256,
}

impl NetworkProfile {
    /// Whether this network gets mocks instead of the real oracle.
    ///
    /// Once a chain id is known only [`LOCAL_CHAIN_ID`] qualifies, so a
    /// public chain missing from the table never falls back to mocks.
    #[must_use]
    pub fn is_development(&self) -> bool {
        match self.chain_id {
            Some(chain_id) => chain_id == LOCAL_CHAIN_ID,
            None => DEVELOPMENT_CHAINS.contains(&self.name.as_str()),
        }
    }

    /// The configured VRF coordinator.
    ///
    /// # Errors
    ///
    /// Fails if the profile has no coordinator address.
    pub fn vrf_coordinator(&self) -> Result<Address, ConfigError> {
        self.vrf_coordinator.ok_or_else(|| ConfigError::MissingAddress {
            network: self.name.clone(),
            contract: "VRF coordinator",
        })
    }

    /// The configured LINK token.
    ///
    /// # Errors
    ///
    /// Fails if the profile has no token address.
    pub fn link_token(&self) -> Result<Address, ConfigError> {
        self.link_token.ok_or_else(|| ConfigError::MissingAddress {
            network: self.name.clone(),
            contract: "LINK token",
        })
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let missing = |field| ConfigError::MissingField {
            network: self.name.clone(),
            field,
        };
        if self.key_hash.is_zero() {
            return Err(missing("keyHash"));
        }
        if self.fund_amount.is_zero() {
            return Err(missing("fundAmount"));
        }
        Ok(self)
    }
}

#[derive(Deserialize)]
struct ProfileEntry {
    name: String,
    #[serde(default)]
    vrf_coordinator: Option<Address>,
    #[serde(default)]
    link_token: Option<Address>,
    #[serde(default)]
    key_hash: B256,
    #[serde(default)]
    fund_amount: U256,
}

impl From<ProfileEntry> for NetworkProfile {
    fn from(entry: ProfileEntry) -> Self {
        Self {
            chain_id: None,
            name: entry.name,
            vrf_coordinator: entry.vrf_coordinator,
            link_token: entry.link_token,
            key_hash: entry.key_hash,
            fund_amount: entry.fund_amount,
        }
    }
}

/// Lookup table from chain id to [`NetworkProfile`].
#[derive(Debug, Clone)]
pub struct NetworkTable {
    default: NetworkProfile,
    chains: BTreeMap<u64, NetworkProfile>,
}

static BUILTIN: Lazy<NetworkTable> = Lazy::new(|| {
    let profile = |name: &str, coordinator, link, key_hash| NetworkProfile {
        chain_id: None,
        name: name.to_owned(),
        vrf_coordinator: coordinator,
        link_token: link,
        key_hash,
        fund_amount: TEN_LINK,
    };

    let chains = BTreeMap::from([
        (LOCAL_CHAIN_ID, profile("localhost", None, None, LOCAL_KEY_HASH)),
        (
            4,
            profile(
                "rinkeby",
                Some(address!("0x6168499c0cFfCaCD319c818142124B7A15E857ab")),
                Some(address!("0x01BE23585060835E02B77ef475b0Cc51aA1e0709")),
                b256!("0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"),
            ),
        ),
        (
            1,
            profile(
                "mainnet",
                Some(address!("0x271682DEB8C4E0901D1a1550aD2e64D568E69909")),
                Some(address!("0x514910771af9ca656af840dff83e8264ecf986ca")),
                b256!("0x8af398995b04c28e9951adb9721ef74c74f93e6a478f39e7e0777be13527e7ef"),
            ),
        ),
    ]);

    NetworkTable {
        default: profile("hardhat", None, None, LOCAL_KEY_HASH),
        chains,
    }
});

impl NetworkTable {
    /// The built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// The built-in table extended with the TOML file at `path`, if any.
    ///
    /// # Errors
    ///
    /// May fail if the file can't be read or parsed.
    pub fn load(path: Option<&Path>) -> eyre::Result<Self> {
        let table = Self::builtin();
        let Some(path) = path else {
            return Ok(table);
        };
        let src = std::fs::read_to_string(path)
            .wrap_err(format!("failed to read {}", path.display()))?;
        table
            .merge_toml(&src)
            .wrap_err(format!("invalid network config {}", path.display()))
    }

    /// Add or replace entries with the ones in `src`.
    ///
    /// Table keys are chain ids, or `default` for the fallback entry.
    ///
    /// # Errors
    ///
    /// May fail if `src` is not valid TOML or a key is not a chain id.
    pub fn merge_toml(mut self, src: &str) -> eyre::Result<Self> {
        let entries: BTreeMap<String, ProfileEntry> = toml::from_str(src)?;
        for (key, entry) in entries {
            if key == DEFAULT_KEY {
                self.default = entry.into();
                continue;
            }
            let chain_id = key.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue {
                    name: "network table key".to_owned(),
                    value: key.clone(),
                }
            })?;
            self.chains.insert(chain_id, entry.into());
        }
        Ok(self)
    }

    /// Chain ids with a dedicated entry.
    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }

    /// Profile for `chain_id`, falling back to the `default` entry.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::MissingField`] if the resolved entry lacks
    /// a key hash or fund amount.
    pub fn resolve(&self, chain_id: u64) -> Result<NetworkProfile, ConfigError> {
        let mut profile = self
            .chains
            .get(&chain_id)
            .unwrap_or(&self.default)
            .clone();
        profile.chain_id = Some(chain_id);
        profile.validate()
    }

    /// Profile for a chain identifier given as a string.
    ///
    /// Non-numeric identifiers resolve to the `default` entry.
    ///
    /// # Errors
    ///
    /// See [`NetworkTable::resolve`].
    pub fn resolve_str(
        &self,
        chain: &str,
    ) -> Result<NetworkProfile, ConfigError> {
        match chain.trim().parse::<u64>() {
            Ok(chain_id) => self.resolve(chain_id),
            Err(_) => self.default.clone().validate(),
        }
    }
}

/// Profile for `chain_id` from the built-in table.
///
/// # Errors
///
/// See [`NetworkTable::resolve`].
pub fn resolve(chain_id: u64) -> Result<NetworkProfile, ConfigError> {
    BUILTIN.resolve(chain_id)
}
