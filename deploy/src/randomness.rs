//! Where the randomness for a mint comes from.
//!
//! On development chains [`SynchronousMock`] drives the mock coordinator
//! and fulfills requests in the same run. On public chains
//! [`AsynchronousOracle`] waits for the Chainlink node to respond.
use std::{fmt, future::Future, pin::pin, time::Duration};

use alloy::{
    primitives::{Address, U256},
    rpc::types::Log,
};
use deployer::{ContextSend, EventExt as _};
use eyre::{bail, eyre, WrapErr};
use futures::{Stream, StreamExt};
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    abi::{RandomSvg, VRFCoordinatorV2Mock, VrfCoordinatorMock},
    error::{ProtocolMismatch, RandomnessTimedOut},
    handoff,
    mocks::to_u96,
    random_svg::MintRequest,
};

const FUND_SUBSCRIPTION_GAS_LIMIT: u64 = 200_000;

/// Funding of the VRF subscription backing a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionState {
    /// Subscription observed through `SubscriptionCreated`. `None` when the
    /// consumer manages its own subscription.
    pub subscription_id: Option<u64>,
    /// LINK added to the subscription.
    pub funded_amount: U256,
}

/// Outcome of waiting for randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfillment {
    /// The request was fulfilled and the token can be finished.
    Fulfilled {
        /// Token that received its random word.
        token_id: U256,
    },
    /// No fulfillment was observed in time.
    TimedOut {
        /// How long the backend waited.
        after: Duration,
    },
}

impl Fulfillment {
    /// The fulfilled token, or a liveness error for `request`.
    ///
    /// # Errors
    ///
    /// Fails with [`RandomnessTimedOut`] when the wait timed out.
    pub fn into_token_id(
        self,
        request: &MintRequest,
    ) -> Result<U256, RandomnessTimedOut> {
        match self {
            Self::Fulfilled { token_id } => Ok(token_id),
            Self::TimedOut { after } => Err(RandomnessTimedOut {
                token_id: request.token_id,
                request_id: request.request_id,
                after,
            }),
        }
    }
}

/// Race `fulfilled` against `timeout`.
///
/// # Errors
///
/// Fails if `fulfilled` fails before the timeout.
pub async fn wait_for_fulfillment<F>(
    timeout: Duration,
    fulfilled: F,
) -> eyre::Result<Fulfillment>
where
    F: Future<Output = eyre::Result<U256>>,
{
    match tokio::time::timeout(timeout, fulfilled).await {
        Ok(token_id) => Ok(Fulfillment::Fulfilled { token_id: token_id? }),
        Err(_) => Ok(Fulfillment::TimedOut { after: timeout }),
    }
}

/// Source of randomness for the Random SVG NFT.
#[allow(async_fn_in_trait)]
pub trait RandomnessBackend {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Called before the consumer is deployed.
    ///
    /// # Errors
    ///
    /// May fail if the backend can't observe the chain.
    async fn prepare(&mut self) -> eyre::Result<()>;

    /// Fund the subscription that pays for `consumer`'s requests.
    ///
    /// # Errors
    ///
    /// May fail if the subscription is never created or funding reverts.
    async fn fund_subscription(
        &mut self,
        consumer: &RandomSvg,
        amount: U256,
    ) -> eyre::Result<SubscriptionState>;

    /// Wait until `request` is fulfilled.
    ///
    /// # Errors
    ///
    /// May fail on RPC or transaction errors. Running out of time is not an
    /// error here but [`Fulfillment::TimedOut`].
    async fn await_randomness(
        &self,
        consumer: &RandomSvg,
        request: &MintRequest,
    ) -> eyre::Result<Fulfillment>;
}

type SubscriptionCreated = VRFCoordinatorV2Mock::SubscriptionCreated;

/// Aborts the task when dropped, so a run failing halfway does not leave
/// its listener polling.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct SubscriptionListener {
    consumer: oneshot::Sender<Address>,
    created: handoff::Receiver<SubscriptionCreated>,
    _task: AbortOnDrop,
}

/// Forward the first `SubscriptionCreated` owned by the consumer whose
/// address arrives on `consumer`. Events seen before the address is known
/// are kept and checked once it is.
async fn forward_own_subscription<S, E>(
    events: S,
    consumer: oneshot::Receiver<Address>,
    created: handoff::Sender<SubscriptionCreated>,
) where
    S: Stream<Item = Result<(SubscriptionCreated, Log), E>>,
    E: fmt::Display,
{
    let mut events = pin!(events);
    let mut consumer = consumer;
    let mut seen = Vec::new();

    let owner = loop {
        tokio::select! {
            owner = &mut consumer => match owner {
                Ok(owner) => break owner,
                Err(_) => return,
            },
            event = events.next() => match event {
                Some(Ok((event, _))) => seen.push(event),
                Some(Err(err)) => warn!(%err, "undecodable SubscriptionCreated log"),
                None => return,
            },
        }
    };

    if let Some(event) = seen.into_iter().find(|event| event.owner == owner) {
        let _ = created.set(event);
        return;
    }
    while let Some(event) = events.next().await {
        match event {
            Ok((event, _)) if event.owner == owner => {
                debug!(subscription_id = event.subId, %owner, "SubscriptionCreated");
                let _ = created.set(event);
                return;
            }
            Ok((event, _)) => {
                debug!(subscription_id = event.subId, owner = %event.owner, "ignoring foreign subscription");
            }
            Err(err) => warn!(%err, "undecodable SubscriptionCreated log"),
        }
    }
}

/// Drives the mock coordinator: learns the subscription from its
/// `SubscriptionCreated` event and fulfills requests immediately.
pub struct SynchronousMock {
    coordinator: VrfCoordinatorMock,
    subscription_timeout: Duration,
    listener: Option<SubscriptionListener>,
}

impl SynchronousMock {
    /// Backend over a deployed mock coordinator.
    #[must_use]
    pub fn new(
        coordinator: VrfCoordinatorMock,
        subscription_timeout: Duration,
    ) -> Self {
        Self { coordinator, subscription_timeout, listener: None }
    }
}

impl RandomnessBackend for SynchronousMock {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn prepare(&mut self) -> eyre::Result<()> {
        let poller = self
            .coordinator
            .SubscriptionCreated_filter()
            .watch()
            .await
            .wrap_err("failed to watch SubscriptionCreated")?;
        let (tx, created) = handoff::channel();
        let (consumer, consumer_rx) = oneshot::channel();

        let task = tokio::spawn(forward_own_subscription(
            poller.into_stream(),
            consumer_rx,
            tx,
        ));

        self.listener = Some(SubscriptionListener {
            consumer,
            created,
            _task: AbortOnDrop(task),
        });
        Ok(())
    }

    async fn fund_subscription(
        &mut self,
        consumer: &RandomSvg,
        amount: U256,
    ) -> eyre::Result<SubscriptionState> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| eyre!("SubscriptionCreated listener was not armed"))?;

        info!("waiting for subscription to be created");
        let SubscriptionListener { consumer: address, created, _task: task } =
            listener;
        // A closed listener shows up as `HandoffError::Closed` below.
        let _ = address.send(*consumer.address());
        let created = created
            .wait(self.subscription_timeout)
            .await
            .wrap_err("SubscriptionCreated was not observed")?;
        drop(task);

        if created.owner != *consumer.address() {
            return Err(ProtocolMismatch {
                step: "await subscription",
                detail: format!(
                    "subscription {} belongs to {}, expected {}",
                    created.subId,
                    created.owner,
                    consumer.address()
                ),
            }
            .into());
        }
        info!(subscription_id = created.subId, "subscription created");

        let receipt = self
            .coordinator
            .fundSubscription(created.subId, to_u96(amount, "fund amount")?)
            .ctx_send("fund subscription")
            .await?;
        let funded: Vec<VRFCoordinatorV2Mock::SubscriptionFunded> =
            receipt.events();
        let funded = funded
            .into_iter()
            .find(|event| event.subId == created.subId)
            .ok_or_else(|| ProtocolMismatch {
                step: "fund subscription",
                detail: format!("no SubscriptionFunded for {}", created.subId),
            })?;

        Ok(SubscriptionState {
            subscription_id: Some(created.subId),
            funded_amount: funded.newBalance.saturating_sub(funded.oldBalance),
        })
    }

    async fn await_randomness(
        &self,
        consumer: &RandomSvg,
        request: &MintRequest,
    ) -> eyre::Result<Fulfillment> {
        let receipt = self
            .coordinator
            .fulfillRandomWords(request.request_id, *consumer.address())
            .ctx_send("fulfill random words")
            .await?;

        let fulfilled: Vec<VRFCoordinatorV2Mock::RandomWordsFulfilled> =
            receipt.events();
        let Some(fulfilled) = fulfilled
            .into_iter()
            .find(|event| event.requestId == request.request_id)
        else {
            return Err(ProtocolMismatch {
                step: "fulfill random words",
                detail: format!(
                    "no RandomWordsFulfilled for request {}",
                    request.request_id
                ),
            }
            .into());
        };
        if !fulfilled.success {
            return Err(ProtocolMismatch {
                step: "fulfill random words",
                detail: format!(
                    "consumer callback failed for request {}",
                    request.request_id
                ),
            }
            .into());
        }

        Ok(Fulfillment::Fulfilled { token_id: request.token_id })
    }
}

/// Waits for a real Chainlink node, bounded by a timeout.
#[derive(Debug, Clone, Copy)]
pub struct AsynchronousOracle {
    timeout: Duration,
}

impl AsynchronousOracle {
    /// Backend giving up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl RandomnessBackend for AsynchronousOracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    async fn prepare(&mut self) -> eyre::Result<()> {
        Ok(())
    }

    async fn fund_subscription(
        &mut self,
        consumer: &RandomSvg,
        amount: U256,
    ) -> eyre::Result<SubscriptionState> {
        consumer
            .fundSubscription(amount)
            .gas(FUND_SUBSCRIPTION_GAS_LIMIT)
            .ctx_send("fund subscription")
            .await?;
        Ok(SubscriptionState { subscription_id: None, funded_amount: amount })
    }

    async fn await_randomness(
        &self,
        consumer: &RandomSvg,
        request: &MintRequest,
    ) -> eyre::Result<Fulfillment> {
        let token_id = request.token_id;

        // Arm the watcher before looking at history so that a fulfillment
        // landing in between is seen by one of the two.
        let poller = consumer
            .CreatedUnfinishedRandomSVG_filter()
            .watch()
            .await
            .wrap_err("failed to watch CreatedUnfinishedRandomSVG")?;

        let mut history = consumer.CreatedUnfinishedRandomSVG_filter();
        if let Some(block) = request.block_number {
            history = history.from_block(block);
        }
        let past = history
            .query()
            .await
            .wrap_err("failed to query CreatedUnfinishedRandomSVG")?;
        if past.iter().any(|(event, _)| event.tokenId == token_id) {
            return Ok(Fulfillment::Fulfilled { token_id });
        }

        info!(
            %token_id,
            timeout_secs = self.timeout.as_secs(),
            "waiting for the Chainlink node to respond"
        );
        wait_for_fulfillment(self.timeout, async move {
            let mut events = pin!(poller.into_stream());
            while let Some(event) = events.next().await {
                let (event, _) = event?;
                if event.tokenId == token_id {
                    return Ok(token_id);
                }
            }
            bail!("CreatedUnfinishedRandomSVG watcher stopped")
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use futures::channel::mpsc;

    use super::*;

    const OURS: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
    const THEIRS: Address = address!("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");

    fn created(sub_id: u64, owner: Address) -> Result<(SubscriptionCreated, Log), String> {
        Ok((SubscriptionCreated { subId: sub_id, owner }, Log::default()))
    }

    #[tokio::test]
    async fn listener_skips_foreign_subscriptions() {
        let (events_tx, events) = mpsc::unbounded();
        let (consumer_tx, consumer) = oneshot::channel();
        let (tx, rx) = handoff::channel();
        let listener = tokio::spawn(forward_own_subscription(events, consumer, tx));

        events_tx.unbounded_send(created(1, THEIRS)).unwrap();
        events_tx.unbounded_send(Err("bad log".to_owned())).unwrap();
        consumer_tx.send(OURS).unwrap();
        events_tx.unbounded_send(created(2, THEIRS)).unwrap();
        events_tx.unbounded_send(created(3, OURS)).unwrap();

        let event = rx.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(event, SubscriptionCreated { subId: 3, owner: OURS });
        listener.await.unwrap();
    }

    #[tokio::test]
    async fn subscription_seen_before_consumer_is_known_is_kept() {
        let (events_tx, events) = mpsc::unbounded();
        let (consumer_tx, consumer) = oneshot::channel();
        let (tx, rx) = handoff::channel();
        let listener = tokio::spawn(forward_own_subscription(events, consumer, tx));

        events_tx.unbounded_send(created(7, OURS)).unwrap();
        tokio::task::yield_now().await;
        consumer_tx.send(OURS).unwrap();

        let event = rx.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(event.subId, 7);
        listener.await.unwrap();
    }

    #[tokio::test]
    async fn listener_stops_when_consumer_is_never_sent() {
        let (_events_tx, events) = mpsc::unbounded::<Result<(SubscriptionCreated, Log), String>>();
        let (consumer_tx, consumer) = oneshot::channel::<Address>();
        let (tx, rx) = handoff::channel();
        let listener = tokio::spawn(forward_own_subscription(events, consumer, tx));

        drop(consumer_tx);
        listener.await.unwrap();
        assert_eq!(
            rx.wait(Duration::from_secs(5)).await,
            Err(handoff::HandoffError::Closed)
        );
    }

    #[tokio::test]
    async fn dropping_the_listener_aborts_its_task() {
        let (alive, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _alive = alive;
            std::future::pending::<()>().await;
        });
        let (consumer, _) = oneshot::channel();
        let (_tx, created) = handoff::channel();

        drop(SubscriptionListener { consumer, created, _task: AbortOnDrop(task) });

        let stopped = tokio::time::timeout(Duration::from_secs(5), stopped).await;
        assert!(matches!(stopped, Ok(Err(_))));
    }

    fn request() -> MintRequest {
        MintRequest {
            request_id: U256::from(42),
            token_id: U256::from(1),
            block_number: Some(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() {
        let timeout = Duration::from_secs(3000);
        let outcome =
            wait_for_fulfillment(timeout, std::future::pending()).await.unwrap();
        assert_eq!(outcome, Fulfillment::TimedOut { after: timeout });

        let err = outcome.into_token_id(&request()).unwrap_err();
        assert_eq!(
            err,
            RandomnessTimedOut {
                token_id: U256::from(1),
                request_id: U256::from(42),
                after: timeout,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fulfillment_before_timeout_wins() {
        let outcome = wait_for_fulfillment(Duration::from_secs(3000), async {
            tokio::time::sleep(Duration::from_secs(90)).await;
            Ok(U256::from(1))
        })
        .await
        .unwrap();

        assert_eq!(outcome, Fulfillment::Fulfilled { token_id: U256::from(1) });
        assert_eq!(outcome.into_token_id(&request()), Ok(U256::from(1)));
    }

    #[tokio::test]
    async fn listener_failure_is_propagated() {
        let err = wait_for_fulfillment(Duration::from_secs(3000), async {
            Err::<U256, _>(eyre!("watcher stopped"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "watcher stopped");
    }
}
