//! Chain port: ERC-20 reads and transaction submission.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Wallet error: {0}")]
    Wallet(String),
    #[error("Signing key address {derived} does not match configured wallet {configured}")]
    AddressMismatch { derived: Address, configured: Address },
    #[error("Connected chain id {actual} does not match configured chain id {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
    #[error("Timed out waiting for confirmation of {0}")]
    ConfirmationTimeout(TxHash),
}

/// On-chain operations used by the swap pipeline.
///
/// Mutating calls return the broadcast hash immediately; callers decide
/// whether to block on `wait_for_success`.
#[async_trait::async_trait]
pub trait ChainPort: Send + Sync {
    /// Address of the signing wallet.
    fn wallet_address(&self) -> Address;

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    /// Send an ERC-20 approve and return the transaction hash.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        value: U256,
    ) -> Result<TxHash, ChainError>;

    /// Send an ERC-20 transfer and return the transaction hash.
    async fn transfer(&self, token: Address, to: Address, value: U256)
        -> Result<TxHash, ChainError>;

    /// Sign and broadcast an arbitrary contract call (the assembled swap).
    /// `gas_fallback` is used when gas estimation fails.
    async fn send_call(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
        gas_fallback: u64,
    ) -> Result<TxHash, ChainError>;

    /// Block until the transaction is mined; error if it reverted or the
    /// confirmation timeout elapses. Returns the inclusion block number.
    async fn wait_for_success(&self, hash: TxHash) -> Result<u64, ChainError>;
}
