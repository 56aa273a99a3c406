//! Application layer: the one-shot swap pipeline and the run lock.

pub mod run_lock;
pub mod swapper;

pub use run_lock::{LockError, RunLock};
pub use swapper::{SwapError, SwapExecutor, SwapReport};
