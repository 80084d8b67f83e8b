//! Execution limits and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default step ceiling for program mode.
pub const DEFAULT_MAX_STEPS: u64 = 100_000;

/// Default operand stack limit.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 1024;

/// Default call stack limit.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// A shared flag that stops a running program at the next instruction.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// and used to cancel a run in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits applied to one program-mode run.
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Instructions executed before `ExecutionLimitExceeded`.
    pub max_steps: u64,
    pub max_stack_depth: usize,
    pub max_call_depth: usize,
    pub cancel: Option<CancelToken>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            cancel: None,
        }
    }
}

impl VmConfig {
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
