//! Deployment toolkit used by the Random SVG NFT scripts and tests.
//!
//! Contracts are deployed from pre-compiled JSON artifacts, recorded in a
//! per-network [`Registry`] and reused on later runs when nothing changed.
mod account;
mod artifact;
mod deploy;
mod error;
mod event;
mod receipt;
mod registry;
mod system;

pub use account::Account;
pub use artifact::Artifact;
pub use deploy::{Deployer, Deployment};
pub use deployer_proc::test;
pub use error::{ContextCall, ContextSend, TransactionFailed};
pub use event::{decode_logs, Ext as EventExt};
pub use receipt::Ext as ReceiptExt;
pub use registry::{DeployedContract, Registry};
pub use system::{rpc_url, wallet, Wallet, DEFAULT_RPC_URL};
