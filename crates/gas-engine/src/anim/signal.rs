use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Write-once completion flag shared by the branches of a promise step.
///
/// Cloning shares the flag. Only the first [`resolve`](Guard::resolve) wins;
/// the chain waiting on the guard continues once it is resolved.
#[derive(Debug, Clone, Default)]
pub struct Guard(Arc<AtomicBool>);

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the guard resolved. Returns `true` for the call that flipped it.
    #[inline]
    pub fn resolve(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One-shot "done" handle a chain callback can trip so code outside the tick
/// loop can observe that an animation sequence finished.
#[derive(Debug, Clone, Default)]
pub struct Completion(Arc<AtomicBool>);

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
