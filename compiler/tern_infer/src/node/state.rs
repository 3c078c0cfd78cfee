//! Per-node scheduling state.
//!
//! ```text
//!            schedule             claim               finish
//!   Idle ─────────────▶ Queued ─────────▶ Processing ─────────▶ Idle
//!     │                                     │    ▲
//!     │ claim (inline resolve)              │    │ finish: run again
//!     └────────────────▶ Processing         ▼    │
//!                              schedule ─▶ Relaunch
//! ```
//!
//! `Queued` and `Relaunch` are the two faces of "needs another pass": the
//! first while no thread owns the node, the second while one does. Any
//! number of schedules during a pass collapse into one extra pass.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const IDLE: u8 = 0;
const QUEUED: u8 = 1;
const PROCESSING: u8 = 2;
const RELAUNCH: u8 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Queued,
    Processing,
    Relaunch,
}

pub(crate) struct NodeState {
    phase: AtomicU8,
    /// Sticky: set after the first completed pass.
    done: AtomicBool,
}

impl Default for NodeState {
    fn default() -> Self {
        NodeState {
            phase: AtomicU8::new(IDLE),
            done: AtomicBool::new(false),
        }
    }
}

impl NodeState {
    pub(crate) fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            IDLE => Phase::Idle,
            QUEUED => Phase::Queued,
            PROCESSING => Phase::Processing,
            _ => Phase::Relaunch,
        }
    }

    /// Ask for another pass. Returns `true` if the caller must push the
    /// node onto a queue.
    pub(crate) fn request(&self) -> bool {
        let mut current = self.phase.load(Ordering::Acquire);
        loop {
            let next = match current {
                IDLE => QUEUED,
                PROCESSING => RELAUNCH,
                _ => return false,
            };
            match self.phase.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next == QUEUED,
                Err(actual) => current = actual,
            }
        }
    }

    /// Take ownership of a node popped from a queue. Fails for stale queue
    /// entries whose node was already claimed elsewhere.
    pub(crate) fn claim_queued(&self) -> bool {
        self.phase
            .compare_exchange(QUEUED, PROCESSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Take ownership outside the worker loop. Fails while another thread
    /// owns the node.
    pub(crate) fn claim_inline(&self) -> bool {
        let mut current = self.phase.load(Ordering::Acquire);
        while matches!(current, IDLE | QUEUED) {
            match self.phase.compare_exchange_weak(
                current,
                PROCESSING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// End a pass. Returns `true` if a schedule arrived during the pass and
    /// the owner must run again.
    pub(crate) fn finish_pass(&self) -> bool {
        self.done.store(true, Ordering::Release);
        match self
            .phase
            .compare_exchange(PROCESSING, IDLE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => false,
            Err(_) => {
                // Only the owner moves the node out of Relaunch.
                self.phase.store(PROCESSING, Ordering::Release);
                true
            }
        }
    }

    /// Give up ownership without another pass, after a fatal error.
    pub(crate) fn abandon(&self) {
        self.phase.store(IDLE, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn first_schedule_enqueues() {
        let state = NodeState::default();
        assert!(state.request());
        assert_eq!(state.phase(), Phase::Queued);
        assert!(!state.request(), "already queued");
        assert!(!state.is_done());
    }

    #[test]
    fn schedules_during_a_pass_collapse_into_one_relaunch() {
        let state = NodeState::default();
        assert!(state.request());
        assert!(state.claim_queued());
        assert!(!state.request());
        assert!(!state.request());
        assert_eq!(state.phase(), Phase::Relaunch);
        assert!(state.finish_pass(), "one more pass");
        assert_eq!(state.phase(), Phase::Processing);
        assert!(!state.finish_pass(), "no further pass");
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.is_done());
    }

    #[test]
    fn stale_queue_entry_is_skipped() {
        let state = NodeState::default();
        assert!(state.request());
        assert!(state.claim_inline());
        assert!(!state.claim_queued());
        assert!(!state.finish_pass());
        assert!(!state.claim_queued());
    }

    #[test]
    fn inline_claim_fails_while_owned() {
        let state = NodeState::default();
        assert!(state.claim_inline());
        assert!(!state.claim_inline());
        state.abandon();
        assert!(state.claim_inline());
    }

    #[test]
    fn concurrent_requests_enqueue_once() {
        let state = Arc::new(NodeState::default());
        let pushes: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let state = Arc::clone(&state);
                    scope.spawn(move || usize::from(state.request()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap_or(0)).sum()
        });
        assert_eq!(pushes, 1);
    }
}
