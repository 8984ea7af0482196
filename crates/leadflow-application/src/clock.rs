//! Injectable time source for delayed directives and typing presence.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Time source used by the scheduler.
///
/// Production code uses [`TokioClock`]; tests run the same clock on a
/// paused tokio runtime (`#[tokio::test(start_paused = true)]`) so that
/// delays elapse deterministically.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep_until(&self, deadline: Instant);

    async fn sleep(&self, duration: Duration) {
        let deadline = self.now() + duration;
        self.sleep_until(deadline).await;
    }
}

/// Clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}
