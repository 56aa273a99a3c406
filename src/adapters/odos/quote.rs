//! Odos Quote Types
//!
//! Request and response structures for the Odos smart order router
//! `/sor/quote/v2` endpoint.

use serde::{Deserialize, Serialize};

/// Request body for a swap quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Chain the swap executes on
    pub chain_id: u64,
    /// Tokens being sold (the bot always sends exactly one)
    pub input_tokens: Vec<InputToken>,
    /// Tokens being bought (always one, proportion 1)
    pub output_tokens: Vec<OutputToken>,
    /// Slippage limit in percent (0.5 = 0.5%)
    pub slippage_limit_percent: f64,
    /// Request the compact calldata encoding
    pub compact: bool,
    /// Wallet the quote is priced for. Omitted on the fallback retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_addr: Option<String>,
}

/// A single input token position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputToken {
    pub token_address: String,
    /// Base-unit amount as a decimal string
    pub amount: String,
}

/// A single output token position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputToken {
    pub token_address: String,
    /// Share of the output routed to this token (always 1 here)
    pub proportion: f64,
}

impl QuoteRequest {
    /// Single-input single-output quote, the only shape the bot uses.
    pub fn single(
        chain_id: u64,
        token_in: String,
        amount_in: String,
        token_out: String,
        slippage_limit_percent: f64,
        user_addr: Option<String>,
    ) -> Self {
        Self {
            chain_id,
            input_tokens: vec![InputToken {
                token_address: token_in,
                amount: amount_in,
            }],
            output_tokens: vec![OutputToken {
                token_address: token_out,
                proportion: 1.0,
            }],
            slippage_limit_percent,
            compact: true,
            user_addr,
        }
    }

    /// The same request without a user address, for the fallback retry.
    pub fn without_user(mut self) -> Self {
        self.user_addr = None;
        self
    }
}

/// Response from the quote endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Opaque path id consumed by `/sor/assemble`
    pub path_id: String,
    /// Estimated outputs, parallel to the requested output tokens
    #[serde(default)]
    pub out_amounts: Vec<String>,
    /// Output token details (amounts as base-unit strings)
    #[serde(default)]
    pub output_tokens: Vec<QuotedToken>,
    /// Price impact percentage, when reported
    #[serde(default)]
    pub price_impact: Option<f64>,
    /// Catch-all for additional fields so API additions don't break parsing
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

/// A quoted token amount
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedToken {
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

impl QuoteResponse {
    /// Estimated output amount in base units, if the API reported one.
    /// Prefers the `outputTokens` entry and falls back to `outAmounts`.
    pub fn estimated_out(&self) -> Option<&str> {
        self.output_tokens
            .first()
            .and_then(|t| t.amount.as_deref())
            .or_else(|| self.out_amounts.first().map(String::as_str))
    }
}
