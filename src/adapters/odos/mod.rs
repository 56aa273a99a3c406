//! Odos aggregator adapter: HTTP client and API types.

pub mod assemble;
pub mod client;
pub mod quote;

pub use assemble::{AssembleRequest, AssembleResponse};
pub use client::{OdosClient, OdosConfig};
pub use quote::{QuoteRequest, QuoteResponse};
