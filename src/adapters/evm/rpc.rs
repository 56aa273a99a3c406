//! EVM RPC client with timeout handling and transaction submission.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint and verify the chain id
//! - Execute ERC-20 reads (decimals, balances, allowances)
//! - Build, sign, and broadcast transactions with gas headroom
//! - Poll for receipts until confirmation or timeout

use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tokio::time::{interval, timeout};

use crate::ports::chain::{ChainError, ChainPort};

use super::erc20::IERC20;
use super::wallet::EvmWallet;

/// Client settings derived from the chain config section.
#[derive(Debug, Clone)]
pub struct EvmSettings {
    pub chain_id: u64,
    /// Per-request RPC timeout.
    pub rpc_timeout: Duration,
    /// How long to wait for a receipt before giving up.
    pub confirmation_timeout: Duration,
    /// Percentage added on top of gas estimates (20 = +20%).
    pub gas_headroom_percent: u64,
}

impl Default for EvmSettings {
    fn default() -> Self {
        Self {
            chain_id: 10,
            rpc_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(180),
            gas_headroom_percent: 20,
        }
    }
}

/// JSON-RPC client bound to a signing wallet.
#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
    wallet: EvmWallet,
    settings: EvmSettings,
}

impl EvmClient {
    /// Connect to the RPC endpoint and verify it serves the expected chain.
    pub async fn connect(
        rpc_url: &str,
        wallet: EvmWallet,
        settings: EvmSettings,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("Invalid RPC URL '{rpc_url}': {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        let client = Self {
            provider,
            wallet,
            settings,
        };

        let actual = client
            .with_timeout(client.provider.get_chain_id())
            .await?
            .map_err(|e| ChainError::Rpc(format!("Failed to query chain id: {e}")))?;
        if actual != client.settings.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: client.settings.chain_id,
                actual,
            });
        }

        tracing::info!(
            rpc_url = %rpc_url,
            chain_id = actual,
            wallet = %client.wallet.address(),
            "EVM client initialized"
        );

        Ok(client)
    }

    async fn with_timeout<T, E>(
        &self,
        fut: impl std::future::IntoFuture<Output = Result<T, E>>,
    ) -> Result<Result<T, E>, ChainError> {
        timeout(self.settings.rpc_timeout, fut)
            .await
            .map_err(|_| ChainError::Rpc("RPC request timed out".to_string()))
    }

    /// Execute a read-only contract call and return the raw bytes.
    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(data);

        self.with_timeout(self.provider.call(tx))
            .await?
            .map_err(|e| ChainError::Rpc(format!("eth_call failed: {e}")))
    }

    /// Build, sign, and broadcast a transaction.
    ///
    /// Nonce and gas price are queried fresh per transaction; the bot sends
    /// them strictly sequentially, so there is no local nonce tracking.
    async fn send_transaction(
        &self,
        to: Address,
        data: Vec<u8>,
        value: U256,
        gas_fallback: u64,
    ) -> Result<TxHash, ChainError> {
        let from = self.wallet.address();

        let nonce = self
            .with_timeout(self.provider.get_transaction_count(from))
            .await?
            .map_err(|e| ChainError::Rpc(format!("Failed to fetch nonce: {e}")))?;

        let gas_price = self
            .with_timeout(self.provider.get_gas_price())
            .await?
            .map_err(|e| ChainError::Rpc(format!("Failed to fetch gas price: {e}")))?;

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_chain_id(self.settings.chain_id);

        let gas_limit = match self
            .with_timeout(self.provider.estimate_gas(tx.clone()))
            .await?
        {
            Ok(estimate) => apply_headroom(estimate, self.settings.gas_headroom_percent),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = gas_fallback,
                    "Gas estimation failed, using fallback limit"
                );
                gas_fallback
            }
        };
        tx = tx.with_gas_limit(gas_limit);

        let signer_wallet = EthereumWallet::from(self.wallet.signer().clone());
        let envelope = tx
            .build(&signer_wallet)
            .await
            .map_err(|e| ChainError::Wallet(format!("Failed to sign transaction: {e}")))?;

        let pending = self
            .with_timeout(self.provider.send_raw_transaction(&envelope.encoded_2718()))
            .await?
            .map_err(|e| ChainError::Rpc(format!("Broadcast failed: {e}")))?;

        let hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %hash, nonce, gas_limit, "Transaction broadcast");
        Ok(hash)
    }
}

/// Add percentage headroom to a gas estimate, rounding up.
fn apply_headroom(estimate: u64, headroom_percent: u64) -> u64 {
    let scaled = estimate as u128 * (100 + headroom_percent as u128);
    scaled.div_ceil(100).min(u64::MAX as u128) as u64
}

#[async_trait]
impl ChainPort for EvmClient {
    fn wallet_address(&self) -> Address {
        self.wallet.address()
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.with_timeout(self.provider.get_balance(owner))
            .await?
            .map_err(|e| ChainError::Rpc(format!("Failed to fetch balance: {e}")))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        let out = self
            .eth_call(token, IERC20::decimalsCall {}.abi_encode())
            .await?;
        IERC20::decimalsCall::abi_decode_returns(&out)
            .map_err(|e| ChainError::Rpc(format!("Failed to decode decimals(): {e}")))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let out = self
            .eth_call(token, IERC20::balanceOfCall { account: owner }.abi_encode())
            .await?;
        IERC20::balanceOfCall::abi_decode_returns(&out)
            .map_err(|e| ChainError::Rpc(format!("Failed to decode balanceOf(): {e}")))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        let out = self
            .eth_call(token, IERC20::allowanceCall { owner, spender }.abi_encode())
            .await?;
        IERC20::allowanceCall::abi_decode_returns(&out)
            .map_err(|e| ChainError::Rpc(format!("Failed to decode allowance(): {e}")))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        value: U256,
    ) -> Result<TxHash, ChainError> {
        let data = IERC20::approveCall { spender, value }.abi_encode();
        self.send_transaction(token, data, U256::ZERO, 120_000).await
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        value: U256,
    ) -> Result<TxHash, ChainError> {
        let data = IERC20::transferCall {
            recipient: to,
            amount: value,
        }
        .abi_encode();
        self.send_transaction(token, data, U256::ZERO, 120_000).await
    }

    async fn send_call(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
        gas_fallback: u64,
    ) -> Result<TxHash, ChainError> {
        self.send_transaction(to, data.to_vec(), value, gas_fallback)
            .await
    }

    async fn wait_for_success(&self, hash: TxHash) -> Result<u64, ChainError> {
        let poll_interval = Duration::from_secs(2);

        let result = timeout(self.settings.confirmation_timeout, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self
                    .with_timeout(self.provider.get_transaction_receipt(hash))
                    .await?
                    .map_err(|e| ChainError::Rpc(format!("Failed to fetch receipt: {e}")))?
                {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Err(ChainError::Reverted(hash));
                }

                return Ok(receipt.block_number.unwrap_or_default());
            }
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(ChainError::ConfirmationTimeout(hash)),
        }
    }
}

impl std::fmt::Debug for EvmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmClient")
            .field("chain_id", &self.settings.chain_id)
            .field("wallet", &self.wallet.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_headroom() {
        assert_eq!(apply_headroom(100_000, 20), 120_000);
        assert_eq!(apply_headroom(0, 20), 0);
        // Rounds up on uneven division
        assert_eq!(apply_headroom(21_001, 20), 25_202);
    }

    #[test]
    fn test_apply_headroom_no_overflow() {
        // u64::MAX * 1.2 overflows u64; the helper must saturate instead
        let result = apply_headroom(u64::MAX, 20);
        assert_eq!(result, u64::MAX);
    }

    #[test]
    fn test_settings_default() {
        let settings = EvmSettings::default();
        assert_eq!(settings.chain_id, 10);
        assert_eq!(settings.gas_headroom_percent, 20);
    }
}
