//! Randomized mint of the Random SVG NFT.
//!
//! The run moves through [`MintStage`]s in order. The consumer is deployed
//! and funded with LINK, its VRF subscription is funded, a mint requests
//! randomness, and once the backend reports the request fulfilled the token
//! is finished and its URI read back. Any failure stops the run; nothing is
//! retried.
use std::fmt;

use alloy::{
    primitives::{uint, Address, U256},
    rpc::types::{Log, TransactionReceipt},
    sol_types::SolConstructor,
};
use deployer::{decode_logs, ContextCall, ContextSend, DeployedContract};
use eyre::bail;
use tracing::info;

use crate::{
    abi::{LinkToken, RandomSVG},
    error::ProtocolMismatch,
    harness::Harness,
    mocks::Mocks,
    randomness::{
        AsynchronousOracle, RandomnessBackend, SubscriptionState,
        SynchronousMock,
    },
};

/// Price of a mint (0.1 ETH).
pub const MINT_FEE: U256 = uint!(100_000_000_000_000_000_U256);

const TRANSFER_GAS_LIMIT: u64 = 200_000;
const CREATE_GAS_LIMIT: u64 = 300_000;
const FINISH_MINT_GAS_LIMIT: u64 = 2_000_000;

/// Stages of a randomized mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MintStage {
    /// Deploying the consumer contract.
    Deploying,
    /// Sending LINK to the consumer.
    Funding,
    /// Waiting for and funding the VRF subscription.
    AwaitingSubscription,
    /// Requesting randomness through `create`.
    Minting,
    /// Waiting for the random word.
    AwaitingRandomness,
    /// Calling `finishMint` and reading the token back.
    Finalizing,
    /// The token is minted.
    Done,
}

impl fmt::Display for MintStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Deploying => "deploying",
            Self::Funding => "funding",
            Self::AwaitingSubscription => "awaiting subscription",
            Self::Minting => "minting",
            Self::AwaitingRandomness => "awaiting randomness",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        f.write_str(stage)
    }
}

/// A randomness request made by `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    /// VRF request id.
    pub request_id: U256,
    /// Token reserved for the request.
    pub token_id: U256,
    /// Block the request was mined in.
    pub block_number: Option<u64>,
}

impl MintRequest {
    /// Extract the request from a `create` receipt.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolMismatch`] if no `RequestedSVGNFT` was emitted.
    pub fn from_receipt(receipt: &TransactionReceipt) -> eyre::Result<Self> {
        Self::from_logs(receipt.inner.logs(), receipt.block_number)
    }

    /// Extract the request from the logs of a `create` transaction.
    ///
    /// # Errors
    ///
    /// See [`MintRequest::from_receipt`].
    pub fn from_logs(
        logs: &[Log],
        block_number: Option<u64>,
    ) -> eyre::Result<Self> {
        let Some(requested) =
            decode_logs::<RandomSVG::RequestedSVGNFT>(logs).next()
        else {
            return Err(ProtocolMismatch {
                step: "create random SVG",
                detail: "no RequestedSVGNFT in receipt".to_owned(),
            }
            .into());
        };
        Ok(Self {
            request_id: requested.requestId,
            token_id: requested.tokenId,
            block_number,
        })
    }
}

/// Everything a finished randomized mint produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomMintReport {
    /// `RandomSVG` record.
    pub contract: DeployedContract,
    /// Subscription funding.
    pub subscription: SubscriptionState,
    /// Request the token was minted from.
    pub request: MintRequest,
    /// Data URI of the finished token.
    pub token_uri: String,
    /// Owner of the finished token.
    pub owner: Address,
}

/// Run a randomized mint, using the mock coordinator when `mocks` is given
/// and the network's Chainlink oracle otherwise.
///
/// # Errors
///
/// May fail with a [`crate::error::ConfigError`] if a public network lacks
/// addresses, or at any stage of the mint.
pub async fn run(
    harness: &Harness,
    mocks: Option<&Mocks>,
) -> eyre::Result<RandomMintReport> {
    match mocks {
        Some(mocks) => {
            let backend = SynchronousMock::new(
                mocks.coordinator(harness),
                harness.config.subscription_timeout,
            );
            let coordinator = mocks.vrf_coordinator.address;
            let link = mocks.link_token.address;
            mint_with(harness, backend, coordinator, link).await
        }
        None if harness.profile.is_development() => {
            bail!("{} needs mocks deployed first", harness.profile.name)
        }
        None => {
            let coordinator = harness.profile.vrf_coordinator()?;
            let link = harness.profile.link_token()?;
            let backend =
                AsynchronousOracle::new(harness.config.randomness_timeout);
            mint_with(harness, backend, coordinator, link).await
        }
    }
}

/// Run a randomized mint against `coordinator` with `backend`.
///
/// # Errors
///
/// See [`run`].
pub async fn mint_with<B: RandomnessBackend>(
    harness: &Harness,
    mut backend: B,
    coordinator: Address,
    link: Address,
) -> eyre::Result<RandomMintReport> {
    let profile = &harness.profile;
    let wallet = &harness.account.wallet;

    enter(MintStage::Deploying, &backend);
    backend.prepare().await?;
    let ctr = RandomSVG::constructorCall {
        vrfCoordinator: coordinator,
        linkToken: link,
        keyHash: profile.key_hash,
    }
    .abi_encode();
    let contract = harness
        .deployer
        .contract("RandomSVG")
        .with_constructor(ctr)
        .fresh()
        .deploy()
        .await?;
    info!(
        "verify with: forge verify-contract --chain {} {} RandomSVG {} {} {}",
        profile.name, contract.address, coordinator, link, profile.key_hash
    );
    let consumer = RandomSVG::new(contract.address, wallet.clone());

    enter(MintStage::Funding, &backend);
    LinkToken::new(link, wallet.clone())
        .transfer(contract.address, profile.fund_amount)
        .gas(TRANSFER_GAS_LIMIT)
        .ctx_send("fund RandomSVG with LINK")
        .await?;

    enter(MintStage::AwaitingSubscription, &backend);
    let subscription =
        backend.fund_subscription(&consumer, profile.fund_amount).await?;
    info!(
        subscription_id = ?subscription.subscription_id,
        funded_amount = %subscription.funded_amount,
        "subscription funded"
    );

    enter(MintStage::Minting, &backend);
    let receipt = consumer
        .create()
        .value(MINT_FEE)
        .gas(CREATE_GAS_LIMIT)
        .ctx_send("create random SVG")
        .await?;
    let request = MintRequest::from_receipt(&receipt)?;
    info!(
        request_id = %request.request_id,
        token_id = %request.token_id,
        "requested a new random SVG"
    );

    enter(MintStage::AwaitingRandomness, &backend);
    let token_id = backend
        .await_randomness(&consumer, &request)
        .await?
        .into_token_id(&request)?;

    enter(MintStage::Finalizing, &backend);
    consumer
        .finishMint(token_id)
        .gas(FINISH_MINT_GAS_LIMIT)
        .ctx_send("finish mint")
        .await?;
    let token_uri = consumer.tokenURI(token_id).ctx_call("tokenURI").await?;
    let owner = consumer.ownerOf(token_id).ctx_call("ownerOf").await?;
    info!(%token_id, %owner, %token_uri, "view the token URI");

    enter(MintStage::Done, &backend);
    Ok(RandomMintReport { contract, subscription, request, token_uri, owner })
}

fn enter<B: RandomnessBackend>(stage: MintStage, backend: &B) {
    info!(%stage, backend = backend.name(), "random SVG mint");
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, Log as PrimitiveLog},
        sol_types::SolEvent,
    };

    use super::*;

    fn log<E: SolEvent>(event: &E) -> Log {
        Log {
            inner: PrimitiveLog {
                address: address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn request_is_read_from_requested_event() {
        let logs = vec![
            log(&RandomSVG::CreatedUnfinishedRandomSVG {
                tokenId: U256::from(9),
                randomWord: U256::from(77),
            }),
            log(&RandomSVG::RequestedSVGNFT {
                requestId: U256::from(1),
                tokenId: U256::ZERO,
            }),
        ];

        let request = MintRequest::from_logs(&logs, Some(12)).unwrap();
        assert_eq!(
            request,
            MintRequest {
                request_id: U256::from(1),
                token_id: U256::ZERO,
                block_number: Some(12),
            }
        );
    }

    #[test]
    fn missing_request_event_is_a_protocol_mismatch() {
        let logs = vec![log(&RandomSVG::CreatedRandomSVG {
            tokenId: U256::ZERO,
            tokenURI: "data:application/json;base64,".to_owned(),
        })];

        let err = MintRequest::from_logs(&logs, None).unwrap_err();
        let mismatch = err.downcast_ref::<ProtocolMismatch>().unwrap();
        assert_eq!(mismatch.step, "create random SVG");
    }

    #[test]
    fn stages_are_ordered() {
        assert!(MintStage::Deploying < MintStage::Funding);
        assert!(MintStage::AwaitingRandomness < MintStage::Finalizing);
        assert_eq!(MintStage::AwaitingSubscription.to_string(), "awaiting subscription");
    }
}
