//! EVM adapter: JSON-RPC client, wallet, and ERC-20 ABI.

pub mod erc20;
pub mod rpc;
pub mod wallet;

pub use rpc::{EvmClient, EvmSettings};
pub use wallet::EvmWallet;
