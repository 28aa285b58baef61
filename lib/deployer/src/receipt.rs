use alloy::{
    network::ReceiptResponse, primitives::Address,
    rpc::types::TransactionReceipt,
};
use eyre::ContextCompat;

use crate::error::TransactionFailed;

/// Extension trait for inspecting mined transactions.
pub trait Ext {
    /// Returns the address of the contract from the [`TransactionReceipt`].
    ///
    /// # Errors
    ///
    /// May fail if there's no contract address.
    fn address(&self) -> eyre::Result<Address>;

    /// Fails with [`TransactionFailed`] when the transaction reverted.
    ///
    /// # Errors
    ///
    /// May fail if the receipt status is not success.
    fn ensure_success(&self, step: &str) -> eyre::Result<()>;
}

impl Ext for TransactionReceipt {
    fn address(&self) -> eyre::Result<Address> {
        self.contract_address().context("should contain contract address")
    }

    fn ensure_success(&self, step: &str) -> eyre::Result<()> {
        if ReceiptResponse::status(self) {
            return Ok(());
        }
        Err(eyre::Report::new(TransactionFailed {
            step: step.to_owned(),
            tx_hash: Some(self.transaction_hash),
        }))
    }
}
