//! Odos Swap Bot Library
//!
//! A one-shot DCA swap bot for Optimism via the Odos aggregator.
//!
//! # Modules
//!
//! - `domain`: Core business logic (amounts, schedule, SwapPlan)
//! - `ports`: Trait abstractions (AggregatorPort, ChainPort)
//! - `adapters`: External implementations (Odos, EVM, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Swap pipeline and run lock

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
