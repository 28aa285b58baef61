//! Failures specific to the deployment workflow.
//!
//! Transaction reverts are reported as [`deployer::TransactionFailed`].
use std::{fmt, time::Duration};

use alloy::primitives::U256;

/// The run was misconfigured. Raised before any transaction is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required network profile field is absent or zero.
    MissingField {
        /// Network the profile belongs to.
        network: String,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A public network has no address configured for a contract.
    MissingAddress {
        /// Network the profile belongs to.
        network: String,
        /// Contract whose address is missing.
        contract: &'static str,
    },
    /// An environment variable or config file entry could not be parsed.
    InvalidValue {
        /// Variable or entry name.
        name: String,
        /// Offending value.
        value: String,
    },
    /// No private key was given for a network that is not a development
    /// chain.
    MissingPrivateKey {
        /// Network being deployed to.
        network: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { network, field } => {
                write!(f, "network {network} has no {field} configured")
            }
            Self::MissingAddress { network, contract } => {
                write!(f, "network {network} has no {contract} address")
            }
            Self::InvalidValue { name, value } => {
                write!(f, "invalid value {value:?} for {name}")
            }
            Self::MissingPrivateKey { network } => {
                write!(f, "PRIVATE_KEY must be set to deploy to {network}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A contract did not behave the way its interface promises, e.g. an
/// expected event is absent from a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMismatch {
    /// Step of the workflow that noticed the mismatch.
    pub step: &'static str,
    /// What was expected and not found.
    pub detail: String,
}

impl fmt::Display for ProtocolMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.detail)
    }
}

impl std::error::Error for ProtocolMismatch {}

/// The oracle did not fulfill a randomness request in time.
///
/// The token is left unfinished on chain; it can be finalized later with
/// `finishMint(token_id)` once the request is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessTimedOut {
    /// Token waiting for randomness.
    pub token_id: U256,
    /// VRF request backing the token.
    pub request_id: U256,
    /// How long the run waited.
    pub after: Duration,
}

impl fmt::Display for RandomnessTimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "randomness for token {} (request {}) not fulfilled after {}s",
            self.token_id,
            self.request_id,
            self.after.as_secs()
        )
    }
}

impl std::error::Error for RandomnessTimedOut {}
