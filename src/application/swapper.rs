//! Swap Pipeline
//!
//! Coordinates one complete swap run: balance check, quote, approval,
//! assembled swap execution, and the optional forward of the acquired
//! tokens. Talks to the world only through the aggregator and chain ports.

use alloy::primitives::{TxHash, U256};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::adapters::evm::erc20::max_approval;
use crate::domain::amount::{from_base_units, to_base_units, AmountError};
use crate::domain::plan::SwapPlan;
use crate::domain::schedule::RunMode;
use crate::ports::aggregator::{AggregatorError, AggregatorPort, QuoteParams, QuoteSummary};
use crate::ports::chain::{ChainError, ChainPort};

/// Gas limit used for the swap when estimation fails.
const SWAP_GAS_FALLBACK: u64 = 500_000;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("Aggregator error: {0}")]
    Aggregator(#[from] AggregatorError),
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Decimal, need: Decimal },
}

/// Outcome of a swap run.
#[derive(Debug, Clone)]
pub struct SwapReport {
    pub mode: RunMode,
    pub amount_in: Decimal,
    /// Set when an approval transaction was needed.
    pub approve_tx: Option<TxHash>,
    /// The swap transaction; `None` for dry runs.
    pub swap_tx: Option<TxHash>,
    /// Estimated output in human units, when the quote reported one.
    pub estimated_out: Option<Decimal>,
    /// Set when the output balance was forwarded.
    pub forward_tx: Option<TxHash>,
    pub forwarded_amount: Option<Decimal>,
}

/// A quote resolved against on-chain token metadata.
#[derive(Debug, Clone)]
pub struct ResolvedQuote {
    pub summary: QuoteSummary,
    pub amount_in_wei: U256,
    pub decimals_in: u8,
    pub decimals_out: u8,
}

impl ResolvedQuote {
    /// Estimated output in human units, if available.
    pub fn estimated_out(&self) -> Option<Decimal> {
        self.summary
            .amount_out
            .and_then(|wei| from_base_units(wei, self.decimals_out).ok())
    }
}

/// Executes the one-shot swap pipeline against a plan.
pub struct SwapExecutor<A, C> {
    aggregator: A,
    chain: C,
    plan: SwapPlan,
}

impl<A: AggregatorPort, C: ChainPort> SwapExecutor<A, C> {
    pub fn new(aggregator: A, chain: C, plan: SwapPlan) -> Self {
        Self {
            aggregator,
            chain,
            plan,
        }
    }

    pub fn plan(&self) -> &SwapPlan {
        &self.plan
    }

    /// Fetch a quote without touching wallet state. Used by the pipeline
    /// and by the quote-only CLI command.
    pub async fn fetch_quote(&self) -> Result<ResolvedQuote, SwapError> {
        let plan = &self.plan;

        let decimals_in = self.chain.token_decimals(plan.token_in).await?;
        let decimals_out = self.chain.token_decimals(plan.token_out).await?;
        let amount_in_wei = to_base_units(plan.amount_in, decimals_in)?;

        let summary = self
            .aggregator
            .quote(&QuoteParams {
                token_in: plan.token_in,
                token_out: plan.token_out,
                amount_in: amount_in_wei,
                slippage_percent: plan.slippage_percent,
                user: plan.wallet,
            })
            .await?;

        Ok(ResolvedQuote {
            summary,
            amount_in_wei,
            decimals_in,
            decimals_out,
        })
    }

    /// Run the full pipeline. In dry-run mode the swap is assembled with
    /// the aggregator's simulate flag and nothing is broadcast.
    pub async fn execute(&self, dry_run: bool) -> Result<SwapReport, SwapError> {
        let plan = self.plan.clone();
        let wallet = plan.wallet;

        tracing::info!(
            mode = %plan.mode,
            amount = %plan.amount_in,
            slippage = %plan.slippage_percent,
            "Starting swap run"
        );

        let decimals_in = self.chain.token_decimals(plan.token_in).await?;
        let decimals_out = self.chain.token_decimals(plan.token_out).await?;
        let amount_in_wei = to_base_units(plan.amount_in, decimals_in)?;

        // Balance must cover the effective amount before anything is sent
        let balance = self.chain.token_balance(plan.token_in, wallet).await?;
        if balance < amount_in_wei {
            let have = from_base_units(balance, decimals_in)?;
            return Err(SwapError::InsufficientBalance {
                have,
                need: plan.amount_in,
            });
        }

        // The router is the spender checked against the allowance below
        let router = self.aggregator.router_address().await?;

        let summary = self
            .aggregator
            .quote(&QuoteParams {
                token_in: plan.token_in,
                token_out: plan.token_out,
                amount_in: amount_in_wei,
                slippage_percent: plan.slippage_percent,
                user: wallet,
            })
            .await?;
        let estimated_out = summary
            .amount_out
            .and_then(|wei| from_base_units(wei, decimals_out).ok());

        if dry_run {
            let assembled = self
                .aggregator
                .assemble(&summary.path_id, wallet, true)
                .await?;
            tracing::info!(
                to = %assembled.to,
                estimated_out = ?estimated_out,
                "Dry run complete, no transaction sent"
            );
            return Ok(SwapReport {
                mode: plan.mode,
                amount_in: plan.amount_in,
                approve_tx: None,
                swap_tx: None,
                estimated_out,
                forward_tx: None,
                forwarded_amount: None,
            });
        }

        // Approve the router once; the max approval makes later runs skip this
        let mut approve_tx = None;
        let allowance = self.chain.allowance(plan.token_in, wallet, router).await?;
        if allowance < amount_in_wei {
            tracing::info!(router = %router, "Allowance too low, approving router");
            let hash = self
                .chain
                .approve(plan.token_in, router, max_approval())
                .await?;
            self.chain.wait_for_success(hash).await?;
            tracing::info!(tx_hash = %hash, "Approval confirmed");
            approve_tx = Some(hash);
        }

        let assembled = self
            .aggregator
            .assemble(&summary.path_id, wallet, false)
            .await?;

        tracing::info!("Sending swap transaction");
        let swap_hash = self
            .chain
            .send_call(
                assembled.to,
                assembled.data,
                assembled.value,
                SWAP_GAS_FALLBACK,
            )
            .await?;
        let block = self.chain.wait_for_success(swap_hash).await?;

        match estimated_out {
            Some(est) => tracing::info!(
                tx_hash = %swap_hash,
                block,
                estimated_out = %est,
                "Swap confirmed"
            ),
            None => tracing::info!(tx_hash = %swap_hash, block, "Swap confirmed"),
        }

        // Forward the entire output balance, not just this swap's proceeds
        let mut forward_tx = None;
        let mut forwarded_amount = None;
        if let Some(send_to) = plan.forward_to {
            let out_balance = self.chain.token_balance(plan.token_out, wallet).await?;
            if out_balance > U256::ZERO {
                let human = from_base_units(out_balance, decimals_out).ok();
                tracing::info!(to = %send_to, amount = ?human, "Forwarding output tokens");
                let hash = self
                    .chain
                    .transfer(plan.token_out, send_to, out_balance)
                    .await?;
                self.chain.wait_for_success(hash).await?;
                tracing::info!(tx_hash = %hash, "Forward confirmed");
                forward_tx = Some(hash);
                forwarded_amount = human;
            } else {
                tracing::info!("No output balance to forward");
            }
        }

        Ok(SwapReport {
            mode: plan.mode,
            amount_in: plan.amount_in,
            approve_tx,
            swap_tx: Some(swap_hash),
            estimated_out,
            forward_tx,
            forwarded_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{CallLog, MockAggregator, MockChain, APPROVE_TX, SWAP_TX};
    use alloy::primitives::Address;
    use rust_decimal_macros::dec;

    const WALLET: Address = Address::with_last_byte(0x10);
    const TOKEN_IN: Address = Address::with_last_byte(0x11);
    const TOKEN_OUT: Address = Address::with_last_byte(0x12);
    const SEND_TO: Address = Address::with_last_byte(0x13);

    fn plan(forward: bool) -> SwapPlan {
        SwapPlan {
            wallet: WALLET,
            token_in: TOKEN_IN,
            token_out: TOKEN_OUT,
            amount_in: dec!(25),
            slippage_percent: dec!(0.5),
            forward_to: forward.then_some(SEND_TO),
            mode: RunMode::Daily,
        }
    }

    fn chain(log: CallLog) -> MockChain {
        MockChain::new(log, WALLET)
            .with_decimals(TOKEN_IN, 6)
            .with_decimals(TOKEN_OUT, 18)
            // 100 tokens at 6 decimals
            .with_balance(TOKEN_IN, WALLET, U256::from(100_000_000u64))
    }

    #[tokio::test]
    async fn test_full_pipeline_with_approval_and_forward() {
        let log = CallLog::default();
        let chain = chain(log.clone()).with_balance(
            TOKEN_OUT,
            WALLET,
            U256::from(500_000_000_000_000_000u64), // 0.5 at 18 decimals
        );
        let executor = SwapExecutor::new(MockAggregator::new(log.clone()), chain, plan(true));

        let report = executor.execute(false).await.unwrap();

        assert_eq!(report.approve_tx, Some(APPROVE_TX));
        assert_eq!(report.swap_tx, Some(SWAP_TX));
        assert!(report.forward_tx.is_some());
        assert_eq!(report.forwarded_amount, Some(dec!(0.5)));

        let calls = log.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "decimals",
                "decimals",
                "balance",
                "router",
                "quote:25000000",
                "allowance",
                "approve",
                "wait",
                "assemble:path-1:false",
                "swap",
                "wait",
                "balance",
                "transfer:0x0000000000000000000000000000000000000013:500000000000000000",
                "wait",
            ]
        );
    }

    #[tokio::test]
    async fn test_approval_skipped_when_allowance_sufficient() {
        let log = CallLog::default();
        let chain = chain(log.clone());
        let agg = MockAggregator::new(log.clone());
        let chain = chain.with_allowance(TOKEN_IN, agg.router(), U256::MAX);
        let executor = SwapExecutor::new(agg, chain, plan(false));

        let report = executor.execute(false).await.unwrap();

        assert!(report.approve_tx.is_none());
        assert_eq!(report.swap_tx, Some(SWAP_TX));
        assert!(!log.lock().unwrap().iter().any(|c| c == "approve"));
    }

    #[tokio::test]
    async fn test_insufficient_balance_sends_nothing() {
        let log = CallLog::default();
        let chain = MockChain::new(log.clone(), WALLET)
            .with_decimals(TOKEN_IN, 6)
            .with_decimals(TOKEN_OUT, 18)
            .with_balance(TOKEN_IN, WALLET, U256::from(1_000_000u64)); // only 1 token
        let executor = SwapExecutor::new(MockAggregator::new(log.clone()), chain, plan(true));

        let err = executor.execute(false).await.unwrap_err();

        match err {
            SwapError::InsufficientBalance { have, need } => {
                assert_eq!(have, dec!(1));
                assert_eq!(need, dec!(25));
            }
            other => panic!("unexpected error: {other}"),
        }

        let calls = log.lock().unwrap().clone();
        assert!(!calls.iter().any(|c| c == "approve" || c == "swap"));
    }

    #[tokio::test]
    async fn test_reverted_swap_aborts_before_forward() {
        let log = CallLog::default();
        let chain = chain(log.clone())
            .with_balance(TOKEN_OUT, WALLET, U256::from(1u64))
            .with_reverting_tx(SWAP_TX);
        let agg = MockAggregator::new(log.clone());
        let chain = chain.with_allowance(TOKEN_IN, agg.router(), U256::MAX);
        let executor = SwapExecutor::new(agg, chain, plan(true));

        let err = executor.execute(false).await.unwrap_err();
        assert!(matches!(err, SwapError::Chain(ChainError::Reverted(_))));

        let calls = log.lock().unwrap().clone();
        assert!(!calls.iter().any(|c| c.starts_with("transfer")));
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let log = CallLog::default();
        let executor = SwapExecutor::new(
            MockAggregator::new(log.clone()),
            chain(log.clone()),
            plan(true),
        );

        let report = executor.execute(true).await.unwrap();

        assert!(report.swap_tx.is_none());
        assert!(report.approve_tx.is_none());
        assert!(report.forward_tx.is_none());

        let calls = log.lock().unwrap().clone();
        assert!(calls.contains(&"assemble:path-1:true".to_string()));
        assert!(!calls.iter().any(|c| c == "approve" || c == "swap"));
    }

    #[tokio::test]
    async fn test_dry_run_still_fetches_router_and_quote() {
        let log = CallLog::default();
        let executor = SwapExecutor::new(
            MockAggregator::new(log.clone()),
            chain(log.clone()),
            plan(false),
        );

        executor.execute(true).await.unwrap();

        let calls = log.lock().unwrap().clone();
        assert!(calls.contains(&"router".to_string()));
        assert!(calls.contains(&"quote:25000000".to_string()));
    }

    #[tokio::test]
    async fn test_forward_skipped_on_zero_balance() {
        let log = CallLog::default();
        let agg = MockAggregator::new(log.clone());
        let chain = chain(log.clone()).with_allowance(TOKEN_IN, agg.router(), U256::MAX);
        let executor = SwapExecutor::new(agg, chain, plan(true));

        let report = executor.execute(false).await.unwrap();

        assert_eq!(report.swap_tx, Some(SWAP_TX));
        assert!(report.forward_tx.is_none());
        assert!(!log
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.starts_with("transfer")));
    }

    #[tokio::test]
    async fn test_quote_failure_propagates() {
        let log = CallLog::default();
        let executor = SwapExecutor::new(
            MockAggregator::new(log.clone()).with_quote_failure(),
            chain(log),
            plan(false),
        );

        let err = executor.execute(false).await.unwrap_err();
        assert!(matches!(
            err,
            SwapError::Aggregator(AggregatorError::NoRoute)
        ));
    }

    #[tokio::test]
    async fn test_fetch_quote_resolves_decimals() {
        let log = CallLog::default();
        let executor = SwapExecutor::new(
            MockAggregator::new(log.clone()).with_amount_out(Some(U256::from(
                1_500_000_000_000_000_000u64, // 1.5 at 18 decimals
            ))),
            chain(log),
            plan(false),
        );

        let quote = executor.fetch_quote().await.unwrap();
        assert_eq!(quote.amount_in_wei, U256::from(25_000_000u64));
        assert_eq!(quote.decimals_in, 6);
        assert_eq!(quote.decimals_out, 18);
        assert_eq!(quote.estimated_out(), Some(dec!(1.5)));
    }
}
