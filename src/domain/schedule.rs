//! Run Schedule
//!
//! The bot swaps a fixed daily amount, except on Fridays where a larger
//! amount can be configured. The external scheduler decides *when* the bot
//! runs; this module only decides *how much* to swap for the current day.

use chrono::{Datelike, Utc, Weekday};
use rust_decimal::Decimal;

/// Which amount was selected for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Daily,
    Friday,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Daily => write!(f, "Daily"),
            RunMode::Friday => write!(f, "Friday"),
        }
    }
}

/// Pick the amount to swap for the given weekday.
///
/// The Friday override only applies when a Friday amount is configured;
/// otherwise Fridays use the daily amount like any other day.
pub fn effective_amount(
    daily: Decimal,
    friday: Option<Decimal>,
    weekday: Weekday,
) -> (Decimal, RunMode) {
    match friday {
        Some(amount) if weekday == Weekday::Fri => (amount, RunMode::Friday),
        _ => (daily, RunMode::Daily),
    }
}

/// Current UTC weekday.
pub fn today_utc() -> Weekday {
    Utc::now().weekday()
}
