//! Odos API Client
//!
//! HTTP client for the Odos smart order router. Handles router discovery,
//! quote fetching (with the no-user fallback), and transaction assembly.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::ports::aggregator::{
    AggregatorError, AggregatorPort, AssembledSwap, QuoteParams, QuoteSummary,
};

use super::assemble::{AssembleRequest, AssembleResponse};
use super::quote::{QuoteRequest, QuoteResponse};

/// Odos API client configuration
#[derive(Debug, Clone)]
pub struct OdosConfig {
    /// Base URL for the Odos API
    pub api_base_url: String,
    /// Chain the quotes are priced for
    pub chain_id: u64,
    /// Request timeout
    pub timeout: Duration,
    /// Number of retry attempts for retryable failures
    pub max_retries: u32,
}

impl Default for OdosConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.odos.xyz".to_string(),
            chain_id: 10,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// Odos DEX aggregator client
#[derive(Debug, Clone)]
pub struct OdosClient {
    config: OdosConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct RouterResponse {
    address: String,
}

impl OdosClient {
    /// Create a new Odos client with default configuration
    pub fn new() -> Result<Self, AggregatorError> {
        Self::with_config(OdosConfig::default())
    }

    /// Create a new Odos client with custom configuration
    pub fn with_config(config: OdosConfig) -> Result<Self, AggregatorError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AggregatorError::ApiError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Fetch the router contract address for the configured chain.
    pub async fn get_router(&self) -> Result<Address, AggregatorError> {
        let url = format!(
            "{}/info/router/v2/{}",
            self.config.api_base_url, self.config.chain_id
        );

        let req = self.http.get(&url);
        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| AggregatorError::ApiError("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| AggregatorError::ApiError(e.to_string()))
            })
            .await?;

        let router: RouterResponse = self.handle_response(response).await?;
        router.address.parse().map_err(|e| {
            AggregatorError::InvalidResponse(format!("bad router address '{}': {e}", router.address))
        })
    }

    /// Get a quote. When the request carries a user address and fails, the
    /// quote is retried once without it before giving up.
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, AggregatorError> {
        match self.post_quote(request).await {
            Ok(quote) => Ok(quote),
            Err(AggregatorError::RateLimited) => Err(AggregatorError::RateLimited),
            Err(first) if request.user_addr.is_some() => {
                tracing::info!("Quote with userAddr failed, retrying without: {first}");
                let fallback = request.clone().without_user();
                self.post_quote(&fallback).await.map_err(|second| {
                    AggregatorError::ApiError(format!("quote failed: {first} / {second}"))
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn post_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, AggregatorError> {
        let url = format!("{}/sor/quote/v2", self.config.api_base_url);
        let req = self.http.post(&url).json(request);

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| AggregatorError::ApiError("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| AggregatorError::ApiError(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Assemble a quoted path into a transaction.
    pub async fn post_assemble(
        &self,
        request: &AssembleRequest,
    ) -> Result<AssembleResponse, AggregatorError> {
        let url = format!("{}/sor/assemble", self.config.api_base_url);
        let req = self.http.post(&url).json(request);

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| AggregatorError::ApiError("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| AggregatorError::ApiError(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Execute a request with retry logic and rate limit handling
    async fn execute_with_retry<F, Fut>(
        &self,
        request_fn: F,
    ) -> Result<reqwest::Response, AggregatorError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, AggregatorError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            match request_fn().await {
                Ok(response) => {
                    // Handle rate limiting (429) with exponential backoff
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                        tracing::warn!(
                            "Rate limited (429), backing off for {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error = Some(AggregatorError::RateLimited);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Retry on server errors (5xx)
                    if response.status().is_server_error() {
                        last_error = Some(AggregatorError::ApiError(format!(
                            "Server error: {}",
                            response.status()
                        )));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AggregatorError::ApiError("Max retries exceeded".into())))
    }

    /// Handle API response and deserialize
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AggregatorError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AggregatorError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if error_text.contains("No viable path") {
                return Err(AggregatorError::NoRoute);
            }

            return Err(AggregatorError::ApiError(format!(
                "API error {status}: {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AggregatorError::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    /// Get the configured API base URL
    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }
}

#[async_trait]
impl AggregatorPort for OdosClient {
    async fn router_address(&self) -> Result<Address, AggregatorError> {
        self.get_router().await
    }

    async fn quote(&self, params: &QuoteParams) -> Result<QuoteSummary, AggregatorError> {
        let slippage = params.slippage_percent.to_f64().ok_or_else(|| {
            AggregatorError::ApiError(format!("bad slippage: {}", params.slippage_percent))
        })?;

        let request = QuoteRequest::single(
            self.config.chain_id,
            params.token_in.to_string(),
            params.amount_in.to_string(),
            params.token_out.to_string(),
            slippage,
            Some(params.user.to_string()),
        );

        let quote = self.get_quote(&request).await?;

        let amount_out = quote
            .estimated_out()
            .map(|raw| {
                raw.parse().map_err(|e| {
                    AggregatorError::InvalidResponse(format!("bad output amount '{raw}': {e}"))
                })
            })
            .transpose()?;

        Ok(QuoteSummary {
            path_id: quote.path_id,
            amount_out,
        })
    }

    async fn assemble(
        &self,
        path_id: &str,
        user: Address,
        simulate: bool,
    ) -> Result<AssembledSwap, AggregatorError> {
        let request = AssembleRequest {
            user_addr: user.to_string(),
            path_id: path_id.to_string(),
            simulate,
        };

        self.post_assemble(&request).await?.into_swap()
    }
}
