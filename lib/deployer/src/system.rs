use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::WrapErr;

pub(crate) const RPC_URL_ENV_VAR_NAME: &str = "RPC_URL";

/// Endpoint of a local Anvil or Hardhat node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Convenience type alias that represents an Ethereum wallet: a provider
/// with the recommended fillers and a local signer attached.
pub type Wallet = DynProvider;

/// Reads the RPC endpoint from `RPC_URL`, falling back to
/// [`DEFAULT_RPC_URL`].
///
/// # Errors
///
/// May fail if the configured value is not a valid URL.
pub fn rpc_url() -> eyre::Result<Url> {
    let url = std::env::var(RPC_URL_ENV_VAR_NAME)
        .unwrap_or_else(|_| DEFAULT_RPC_URL.to_owned());
    url.parse().wrap_err(format!("failed to parse {url} into a URL"))
}

/// Build a [`Wallet`] that signs with `signer` and talks to `rpc_url`.
#[must_use]
pub fn wallet(signer: PrivateKeySigner, rpc_url: Url) -> Wallet {
    ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url)
        .erased()
}
