//! Deploys the SVG NFT and Random SVG NFT contracts and mints a token of
//! each.
//!
//! On development chains (`hardhat`, `localhost`) a mock LINK token and VRF
//! coordinator are deployed first and randomness is fulfilled within the
//! same run. On public networks the mint waits for the Chainlink oracle.
pub mod abi;
pub mod config;
pub mod error;
pub mod handoff;
pub mod harness;
pub mod mocks;
pub mod network;
pub mod random_svg;
pub mod randomness;
pub mod svg_nft;
