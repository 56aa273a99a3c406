//! Core domain logic: amount conversion, scheduling, and the swap plan.

pub mod amount;
pub mod plan;
pub mod schedule;

pub use amount::{from_base_units, to_base_units, AmountError};
pub use plan::SwapPlan;
pub use schedule::{effective_amount, RunMode};
