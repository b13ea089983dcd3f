//! # Run Hooks
//!
//! Cooperative progress reporting and cancellation for long runs.
//!
//! The engine is synchronous; the only blocking-equivalent point is the
//! cancellation check the pipeline performs once per iteration. Hosts
//! (CLI, GUI shells) implement [`RunHooks`] to surface progress and to
//! request a stop; the default implementations make hooks fully
//! optional.

/// Host-side callbacks for an enrichment run.
///
/// Implementations must be cheap: `report_step` is called from inside
/// rule loops and `stop_requested` once per pipeline iteration.
pub trait RunHooks {
    /// Report progress. `done` out of `total` units of the current step.
    fn report_step(&self, info: &str, done: usize, total: usize) {
        let _ = (info, done, total);
    }

    /// Has the host asked the run to stop?
    ///
    /// Cancellation granularity is one full iteration; a run stopped
    /// here still returns its partial results.
    fn stop_requested(&self) -> bool {
        false
    }
}

/// Hooks that do nothing. Used when the caller supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl RunHooks for NoopHooks {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_hooks_never_stop() {
        let hooks = NoopHooks;
        hooks.report_step("step", 0, 10);
        assert!(!hooks.stop_requested());
    }
}
