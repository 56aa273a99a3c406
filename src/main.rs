//! Odos Swap Bot - One-shot DCA swaps on Optimism
//!
//! Each invocation performs a single swap via the Odos aggregator and then
//! exits; an external scheduler decides when runs happen.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use odos_swap_bot::adapters::cli::{CliApp, Command, QuoteCmd, RunCmd, StatusCmd};
use odos_swap_bot::adapters::evm::{EvmClient, EvmSettings, EvmWallet};
use odos_swap_bot::adapters::odos::{OdosClient, OdosConfig};
use odos_swap_bot::application::{RunLock, SwapExecutor};
use odos_swap_bot::config::{load_config, Config};
use odos_swap_bot::domain::amount::from_base_units;
use odos_swap_bot::domain::schedule::today_utc;
use odos_swap_bot::domain::SwapPlan;
use odos_swap_bot::ports::chain::ChainPort;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present (PRIVATE_KEY and overrides go here, not in TOML)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Quote(cmd) => quote_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

fn evm_settings(config: &Config) -> EvmSettings {
    EvmSettings {
        chain_id: config.chain.chain_id,
        rpc_timeout: Duration::from_secs(config.chain.rpc_timeout_secs),
        confirmation_timeout: Duration::from_secs(config.chain.confirmation_timeout_secs),
        gas_headroom_percent: config.chain.gas_headroom_percent,
    }
}

fn odos_client(config: &Config) -> Result<OdosClient> {
    OdosClient::with_config(OdosConfig {
        api_base_url: config.odos.api_url.clone(),
        chain_id: config.chain.chain_id,
        timeout: Duration::from_secs(config.odos.request_timeout_secs),
        max_retries: config.odos.max_retries,
    })
    .context("Failed to create Odos client")
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting Odos swap run...");

    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let plan = SwapPlan::from_config(&config, today_utc())?;

    // One transaction-sending run at a time; dry runs don't compete
    let _lock = if cmd.dry_run {
        None
    } else {
        Some(RunLock::acquire(&cmd.lock_file)?)
    };

    let wallet = EvmWallet::from_env().context(
        "Set the PRIVATE_KEY environment variable (or put it in .env) to run swaps",
    )?;
    wallet.ensure_matches(plan.wallet)?;

    if !cmd.yes && !cmd.dry_run {
        println!(
            "About to swap {} of {} into {} ({} mode, slippage {}%)",
            plan.amount_in, plan.token_in, plan.token_out, plan.mode, plan.slippage_percent
        );
        print!("Proceed? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let chain = EvmClient::connect(&config.chain.rpc_url, wallet, evm_settings(&config))
        .await
        .context("Failed to connect to RPC")?;
    let odos = odos_client(&config)?;

    if cmd.dry_run {
        tracing::warn!("DRY RUN mode - no transaction will be sent");
    }

    let executor = SwapExecutor::new(odos, chain, plan);
    let report = executor.execute(cmd.dry_run).await?;

    println!("Swap run complete ({} mode)", report.mode);
    println!("  Amount in:     {}", report.amount_in);
    if let Some(hash) = report.approve_tx {
        println!("  Approval:      {hash}");
    }
    match report.swap_tx {
        Some(hash) => println!("  Swap:          {hash}"),
        None => println!("  Swap:          skipped (dry run)"),
    }
    if let Some(est) = report.estimated_out {
        println!("  Estimated out: ~{est}");
    }
    if let Some(hash) = report.forward_tx {
        println!(
            "  Forwarded:     {} ({hash})",
            report
                .forwarded_amount
                .map(|a| a.to_string())
                .unwrap_or_else(|| "?".to_string())
        );
    }

    Ok(())
}

async fn quote_command(cmd: QuoteCmd) -> Result<()> {
    let mut config = load_config(&cmd.config)?;

    // A quote override beats both the daily and the Friday amount
    if let Some(amount) = cmd.amount {
        if amount <= rust_decimal::Decimal::ZERO {
            bail!("--amount must be positive");
        }
        config.swap.amount_in = amount;
        config.swap.friday_amount_in = None;
    }

    let plan = SwapPlan::from_config(&config, today_utc())?;

    // Quoting is read-only; fall back to a throwaway key when none is set
    let wallet = EvmWallet::from_env().unwrap_or_else(|_| EvmWallet::random());
    let chain = EvmClient::connect(&config.chain.rpc_url, wallet, evm_settings(&config))
        .await
        .context("Failed to connect to RPC")?;
    let odos = odos_client(&config)?;

    let executor = SwapExecutor::new(odos, chain, plan);
    let quote = executor.fetch_quote().await.context("Failed to get quote")?;
    let plan = executor.plan();

    println!("Quote: {} {} -> {}", plan.amount_in, plan.token_in, plan.token_out);
    match quote.estimated_out() {
        Some(est) => println!("  Estimated out: ~{est}"),
        None => println!("  Estimated out: (not reported)"),
    }
    println!("  Slippage:      {}%", plan.slippage_percent);
    println!("  Path id:       {}", quote.summary.path_id);

    Ok(())
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_config(&cmd.config)?;
    let plan = SwapPlan::from_config(&config, today_utc())?;

    let wallet = EvmWallet::from_env().unwrap_or_else(|_| EvmWallet::random());
    let chain = EvmClient::connect(&config.chain.rpc_url, wallet, evm_settings(&config))
        .await
        .context("Failed to connect to RPC")?;

    let native = chain.native_balance(plan.wallet).await?;
    let native_eth = from_base_units(native, 18)?;

    println!("Wallet:  {}", plan.wallet);
    println!("Native:  {native_eth} ETH");

    for (label, token) in [("In", plan.token_in), ("Out", plan.token_out)] {
        let decimals = chain.token_decimals(token).await?;
        let balance = chain.token_balance(token, plan.wallet).await?;
        let human = from_base_units(balance, decimals)?;
        println!("{label:>5}:   {human} ({token})");
    }

    if let Some(forward) = plan.forward_to {
        println!("Forward: {forward}");
    }

    Ok(())
}
