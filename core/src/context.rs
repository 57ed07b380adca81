//! Per-call deadline and cancellation.
//!
//! A `Context` travels with every call. Cloning it shares the same cancel
//! flag, so any clone can cancel the call it was handed to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TransportError;

/// Longest single nap taken by [`Context::sleep`] before rechecking the
/// cancel flag.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Shared flag set by [`CancelToken::cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Deadline plus cancel flag for one logical operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Context {
    /// A context that never expires and is only cancelled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancelToken::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Time left before the deadline, `None` when there is no deadline.
    ///
    /// Fails if the context was cancelled or the deadline already passed.
    pub fn remaining(&self) -> Result<Option<Duration>, TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        match self.deadline {
            None => Ok(None),
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    Err(TransportError::Timeout)
                } else {
                    Ok(Some(left))
                }
            }
        }
    }

    /// Whether waiting `duration` from now still ends before the deadline.
    pub fn has_time_for(&self, duration: Duration) -> bool {
        self.deadline
            .map_or(true, |deadline| Instant::now() + duration < deadline)
    }

    /// Sleep for `duration`, waking early with an error on cancellation or
    /// when the deadline would pass first.
    pub fn sleep(&self, duration: Duration) -> Result<(), TransportError> {
        let wake = Instant::now() + duration;
        if let Some(deadline) = self.deadline {
            if deadline < wake {
                return Err(TransportError::Timeout);
            }
        }
        loop {
            self.remaining()?;
            let left = wake.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(());
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_expires() {
        let ctx = Context::background();
        assert_eq!(ctx.remaining().unwrap(), None);
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        clone.cancel();
        assert!(matches!(ctx.remaining(), Err(TransportError::Cancelled)));
    }

    #[test]
    fn expired_deadline_is_timeout() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(ctx.remaining(), Err(TransportError::Timeout)));
    }

    #[test]
    fn sleep_past_deadline_fails_fast() {
        let ctx = Context::with_timeout(Duration::from_millis(10));
        let started = Instant::now();
        assert!(matches!(ctx.sleep(Duration::from_secs(5)), Err(TransportError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_observes_cancellation() {
        let ctx = Context::background();
        let token = ctx.cancel_token();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            token.cancel();
        });
        assert!(matches!(ctx.sleep(Duration::from_secs(5)), Err(TransportError::Cancelled)));
    }

    #[test]
    fn has_time_for_respects_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        assert!(ctx.has_time_for(Duration::from_millis(10)));
        assert!(!ctx.has_time_for(Duration::from_secs(60)));
        assert!(Context::background().has_time_for(Duration::from_secs(3600)));
    }

    #[test]
    fn short_sleep_completes() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        ctx.sleep(Duration::from_millis(5)).unwrap();
    }
}
