//! Trait abstractions between the pipeline and the outside world.

pub mod aggregator;
pub mod chain;
pub mod mocks;

pub use aggregator::{AggregatorError, AggregatorPort, AssembledSwap, QuoteParams, QuoteSummary};
pub use chain::{ChainError, ChainPort};
