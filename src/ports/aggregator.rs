//! Aggregator port: quote and assemble swaps through a DEX aggregator.

use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("No route found for the requested pair")]
    NoRoute,
    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),
}

/// Parameters for a swap quote.
#[derive(Debug, Clone)]
pub struct QuoteParams {
    pub token_in: Address,
    pub token_out: Address,
    /// Input amount in base units.
    pub amount_in: U256,
    /// Slippage limit in percent (0.5 = 0.5%).
    pub slippage_percent: Decimal,
    /// Wallet the quote is priced for.
    pub user: Address,
}

/// The interesting parts of a quote response.
#[derive(Debug, Clone)]
pub struct QuoteSummary {
    /// Opaque id handed back to the assemble endpoint.
    pub path_id: String,
    /// Estimated output in base units, when the API reports one.
    pub amount_out: Option<U256>,
}

/// An assembled swap transaction ready for signing.
#[derive(Debug, Clone)]
pub struct AssembledSwap {
    pub to: Address,
    pub data: Bytes,
    /// Native token value to attach (non-zero when swapping the native coin).
    pub value: U256,
}

/// DEX aggregator operations used by the swap pipeline.
#[async_trait::async_trait]
pub trait AggregatorPort: Send + Sync {
    /// Address of the aggregator's router contract, the ERC-20 spender.
    async fn router_address(&self) -> Result<Address, AggregatorError>;

    /// Price a swap and obtain a path id for assembly.
    async fn quote(&self, params: &QuoteParams) -> Result<QuoteSummary, AggregatorError>;

    /// Turn a quoted path into a signable transaction.
    async fn assemble(
        &self,
        path_id: &str,
        user: Address,
        simulate: bool,
    ) -> Result<AssembledSwap, AggregatorError>;
}
