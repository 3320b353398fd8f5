//! Cooperative cancellation for long-running grammar builds (spec.md §5).
//!
//! The teacher has no equivalent: `alap_gen_ng`'s grammar construction runs
//! to completion synchronously. This crate's fixed-point loops (FIRST-set
//! computation, lookahead propagation, LR(0) state construction) can run
//! long on large or pathological grammars, so each polls a token between
//! iterations rather than per symbol, keeping the check cheap.

/// Polled between outer iterations of the compiler's fixed-point loops.
/// Never polled mid-iteration: cancellation granularity is "finish this
/// round of work, then stop", not "stop this instant".
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// The default token: a build that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// An `AtomicBool`-backed token a caller can flip from another thread.
#[derive(Debug, Clone, Default)]
pub struct AtomicCancellationToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl AtomicCancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

impl CancellationToken for AtomicCancellationToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::Relaxed)
    }
}
