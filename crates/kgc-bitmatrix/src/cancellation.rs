use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A coarse-grained cancellation flag for long-running mutation-phase
/// operations (`materialize` over large class graphs, `ask_batch` over huge
/// pattern arrays, full-graph validation).
///
/// The flag is checked between outer-loop iterations — between Warshall
/// pivots, between 4-wide batch groups — never inside one, matching the
/// granularity the concurrency model requires.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let t = CancellationToken::new();
        assert!(!t.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let t = CancellationToken::new();
        let clone = t.clone();
        clone.cancel();
        assert!(t.is_cancelled());
    }
}
