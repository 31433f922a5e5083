//! Cancellation token for long-running operations.
//!
//! Operations that touch the store or iterate over many accounts accept a
//! `Cancellation` and check it at their suspension points. A cancelled
//! operation stops at the next checkpoint and leaves persistent state
//! untouched, except for writes already committed before cancellation was
//! observed. Deadlines are expressed by the caller as a deadline on the
//! token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A cloneable cancellation handle.
///
/// Clones share the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Option<Arc<Shared>>,
}

#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A token that never cancels.
    #[must_use]
    pub const fn none() -> Self {
        Self { inner: None }
    }

    /// Creates a token that cancels when [`Cancellation::cancel`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Some(Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                deadline: None,
            })),
        }
    }

    /// Creates a token that also cancels once the deadline has passed.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Some(Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                deadline: Some(deadline),
            })),
        }
    }

    /// Requests cancellation. No-op on [`Cancellation::none`].
    pub fn cancel(&self) {
        if let Some(shared) = &self.inner {
            shared.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Returns true if cancellation has been requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match &self.inner {
            None => false,
            Some(shared) => {
                if shared.cancelled.load(Ordering::SeqCst) {
                    return true;
                }
                match shared.deadline {
                    Some(deadline) => Instant::now() >= deadline,
                    None => false,
                }
            }
        }
    }
}
