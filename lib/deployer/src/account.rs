use std::str::FromStr;

use alloy::{
    network::TransactionBuilder,
    primitives::{uint, Address, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::WrapErr;
use once_cell::sync::Lazy;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::system::{self, Wallet};

/// First pre-funded account of Anvil and Hardhat development nodes.
pub(crate) const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEFAULT_FUNDING_ETH: U256 = uint!(10_000_000_000_000_000_000_U256);

/// An account able to sign and send transactions.
#[derive(Clone)]
pub struct Account {
    /// The account's local private key wrapper.
    pub signer: PrivateKeySigner,
    /// The account's wallet -- an `alloy` provider with a `WalletFiller`.
    pub wallet: Wallet,
}

impl Account {
    /// Create a fresh account funded with [`DEFAULT_FUNDING_ETH`] by the
    /// development node's pre-funded account.
    ///
    /// # Errors
    ///
    /// May fail if the RPC endpoint is unreachable or funding the newly
    /// created account fails.
    pub async fn new() -> eyre::Result<Self> {
        AccountFactory::create().await
    }

    /// Load an account from a hex-encoded private key.
    ///
    /// # Errors
    ///
    /// May fail if `private_key` is not a valid secp256k1 key.
    pub fn from_private_key(
        private_key: &str,
        rpc_url: Url,
    ) -> eyre::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key)
            .wrap_err("failed to parse private key")?;
        let wallet = system::wallet(signer.clone(), rpc_url);
        Ok(Self { signer, wallet })
    }

    /// The pre-funded account of a local development node.
    ///
    /// # Errors
    ///
    /// May fail if the built-in development key is rejected by the signer.
    pub fn dev(rpc_url: Url) -> eyre::Result<Self> {
        Self::from_private_key(DEV_PRIVATE_KEY, rpc_url)
    }

    /// Retrieve this account's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get gas token balance.
    ///
    /// # Errors
    ///
    /// May fail if the RPC request fails.
    pub async fn balance(&self) -> eyre::Result<U256> {
        self.wallet
            .get_balance(self.address())
            .await
            .wrap_err("failed to get balance")
    }

    /// Send gas token to an address and wait for the transfer to be mined.
    ///
    /// # Errors
    ///
    /// May fail if the transaction cannot be sent or is never mined.
    pub async fn send_value(
        &self,
        to: Address,
        value: U256,
    ) -> eyre::Result<()> {
        let tx = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_value(value);

        let tx_hash = self
            .wallet
            .send_transaction(tx)
            .await
            .wrap_err(format!("failed to send {value} wei to {to}"))?
            .watch()
            .await
            .wrap_err(format!("transfer of {value} wei to {to} not mined"))?;
        debug!(%to, %value, tx = %tx_hash, "sent value");

        Ok(())
    }
}

/// A unit struct used as a synchronization mechanism in
/// [`SYNC_ACCOUNT_FACTORY`].
struct AccountFactory;

impl AccountFactory {
    /// Get access to the factory in a synchronized manner.
    async fn lock() -> MutexGuard<'static, Self> {
        /// Since new accounts get funded from the single pre-funded
        /// development account, account creation must be serialized
        /// (otherwise the nonce will be too low).
        static SYNC_ACCOUNT_FACTORY: Lazy<Mutex<AccountFactory>> =
            Lazy::new(|| Mutex::new(AccountFactory));

        SYNC_ACCOUNT_FACTORY.lock().await
    }

    /// Create a new random account and fund it from the development account.
    async fn create() -> eyre::Result<Account> {
        let _lock = AccountFactory::lock().await;

        let rpc_url = system::rpc_url()?;
        let master = Account::dev(rpc_url.clone())?;

        let signer = PrivateKeySigner::random();
        master.send_value(signer.address(), DEFAULT_FUNDING_ETH).await?;

        let wallet = system::wallet(signer.clone(), rpc_url);
        Ok(Account { signer, wallet })
    }
}
