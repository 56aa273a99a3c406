//! Swap Plan
//!
//! A fully resolved description of the swap a single run will perform:
//! parsed addresses, the amount selected for today, and the slippage limit.
//! Building the plan is the last step that can fail on bad input before the
//! pipeline starts talking to the network.

use alloy::primitives::Address;
use chrono::Weekday;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::Config;
use crate::domain::schedule::{effective_amount, RunMode};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid {field} address '{value}': {source}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        source: alloy::primitives::hex::FromHexError,
    },
    #[error("token_in and token_out must differ")]
    SameToken,
    #[error("slippage must be between 0 and 100 percent, got {0}")]
    InvalidSlippage(Decimal),
}

/// Resolved parameters for one swap run.
#[derive(Debug, Clone)]
pub struct SwapPlan {
    pub wallet: Address,
    pub token_in: Address,
    pub token_out: Address,
    /// Human-readable input amount; converted to base units once the input
    /// token's decimals are known.
    pub amount_in: Decimal,
    pub slippage_percent: Decimal,
    /// Where to send the acquired tokens after the swap, if anywhere.
    pub forward_to: Option<Address>,
    pub mode: RunMode,
}

impl SwapPlan {
    /// Build a plan from validated configuration for the given weekday.
    pub fn from_config(config: &Config, weekday: Weekday) -> Result<Self, PlanError> {
        let wallet = parse_address("wallet", &config.wallet.address)?;
        let token_in = parse_address("token_in", &config.swap.token_in)?;
        let token_out = parse_address("token_out", &config.swap.token_out)?;

        if token_in == token_out {
            return Err(PlanError::SameToken);
        }

        let slippage = config.odos.slippage_percent;
        if slippage <= Decimal::ZERO || slippage >= Decimal::ONE_HUNDRED {
            return Err(PlanError::InvalidSlippage(slippage));
        }

        let forward_to = config
            .swap
            .forward_to
            .as_deref()
            .map(|raw| parse_address("forward_to", raw))
            .transpose()?;

        let (amount_in, mode) =
            effective_amount(config.swap.amount_in, config.swap.friday_amount_in, weekday);

        Ok(Self {
            wallet,
            token_in,
            token_out,
            amount_in,
            slippage_percent: slippage,
            forward_to,
            mode,
        })
    }
}

fn parse_address(field: &'static str, raw: &str) -> Result<Address, PlanError> {
    raw.parse().map_err(|source| PlanError::InvalidAddress {
        field,
        value: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::valid_config;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plan_from_config() {
        let config = valid_config();
        let plan = SwapPlan::from_config(&config, Weekday::Wed).unwrap();

        assert_eq!(plan.amount_in, dec!(25));
        assert_eq!(plan.mode, RunMode::Daily);
        assert_eq!(plan.slippage_percent, dec!(0.5));
        assert!(plan.forward_to.is_some());
    }

    #[test]
    fn test_plan_friday_amount() {
        let config = valid_config();
        let plan = SwapPlan::from_config(&config, Weekday::Fri).unwrap();

        assert_eq!(plan.amount_in, dec!(100));
        assert_eq!(plan.mode, RunMode::Friday);
    }

    #[test]
    fn test_plan_rejects_bad_address() {
        let mut config = valid_config();
        config.swap.token_in = "not-an-address".to_string();

        let err = SwapPlan::from_config(&config, Weekday::Mon).unwrap_err();
        assert!(matches!(
            err,
            PlanError::InvalidAddress {
                field: "token_in",
                ..
            }
        ));
    }

    #[test]
    fn test_plan_rejects_same_token() {
        let mut config = valid_config();
        config.swap.token_out = config.swap.token_in.clone();

        let err = SwapPlan::from_config(&config, Weekday::Mon).unwrap_err();
        assert!(matches!(err, PlanError::SameToken));
    }

    #[test]
    fn test_plan_rejects_bad_slippage() {
        let mut config = valid_config();
        config.odos.slippage_percent = dec!(100);

        let err = SwapPlan::from_config(&config, Weekday::Mon).unwrap_err();
        assert!(matches!(err, PlanError::InvalidSlippage(_)));
    }

    #[test]
    fn test_plan_without_forward() {
        let mut config = valid_config();
        config.swap.forward_to = None;

        let plan = SwapPlan::from_config(&config, Weekday::Mon).unwrap();
        assert!(plan.forward_to.is_none());
    }
}
