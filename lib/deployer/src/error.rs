use alloy::{
    contract::{CallBuilder, CallDecoder},
    primitives::TxHash,
    providers::Provider,
    rpc::types::TransactionReceipt,
};
use eyre::WrapErr;

use crate::receipt::Ext as _;

/// A transaction was mined but reverted, or could not be sent at all.
#[derive(Debug)]
pub struct TransactionFailed {
    /// Step of the workflow that issued the transaction.
    pub step: String,
    /// Hash of the mined transaction, when there is one.
    pub tx_hash: Option<TxHash>,
}

impl TransactionFailed {
    /// Convert [`eyre::Report`] into [`TransactionFailed`].
    #[must_use]
    pub fn from_report(report: &eyre::Report) -> Option<&Self> {
        report.downcast_ref::<TransactionFailed>()
    }
}

impl std::fmt::Display for TransactionFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tx_hash {
            Some(hash) => write!(f, "{}: transaction {hash} reverted", self.step),
            None => write!(f, "{}: transaction was not sent", self.step),
        }
    }
}

impl std::error::Error for TransactionFailed {}

/// Signs and broadcasts contract calls, waiting for one confirmation.
#[allow(async_fn_in_trait)]
pub trait ContextSend {
    /// Sends the transaction and waits for its receipt.
    ///
    /// Wraps errors with the `step` name.
    ///
    /// # Errors
    ///
    /// May fail if the transaction can't be sent, is not mined, or reverts.
    async fn ctx_send(self, step: &str) -> eyre::Result<TransactionReceipt>;
}

impl<P: Provider, D: CallDecoder> ContextSend for CallBuilder<P, D> {
    async fn ctx_send(self, step: &str) -> eyre::Result<TransactionReceipt> {
        let pending = self.send().await.map_err(|e| {
            eyre::Report::new(e).wrap_err(TransactionFailed {
                step: step.to_owned(),
                tx_hash: None,
            })
        })?;
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .wrap_err(format!("{step}: receipt not available"))?;
        receipt.ensure_success(step)?;
        Ok(receipt)
    }
}

/// Queries the blockchain via `eth_call`.
#[allow(async_fn_in_trait)]
pub trait ContextCall<R> {
    /// Executes the call without mutating state.
    ///
    /// Wraps errors with the `step` name.
    ///
    /// # Errors
    ///
    /// May fail if the call reverts or the response can't be decoded.
    async fn ctx_call(self, step: &str) -> eyre::Result<R>;
}

impl<P: Provider, D: CallDecoder> ContextCall<D::CallOutput>
    for CallBuilder<P, D>
{
    async fn ctx_call(self, step: &str) -> eyre::Result<D::CallOutput> {
        self.call().await.wrap_err(format!("call {step}"))
    }
}
