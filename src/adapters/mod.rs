//! External implementations of the ports (Odos API, EVM RPC, CLI).

pub mod cli;
pub mod evm;
pub mod odos;
