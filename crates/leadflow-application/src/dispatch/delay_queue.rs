//! Per-session FIFO queue of delayed work.

use crate::clock::Clock;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// A unit of delayed work. It runs after `delay` has elapsed since the
/// previous job of the same session finished.
struct Scheduled {
    delay: Duration,
    job: BoxFuture<'static, ()>,
}

type Workers = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Scheduled>>>>;

/// Runs delayed jobs one at a time per session, in submission order.
///
/// A worker task is spawned on the first submission for a session and
/// exits once its queue is empty. Jobs are never cancelled; a job keeps
/// its place even if every viewer of the session disconnects.
pub struct DelayQueue {
    clock: Arc<dyn Clock>,
    workers: Workers,
}

impl DelayQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Appends `job` to the session's queue.
    pub async fn schedule(&self, session_id: &str, delay: Duration, job: BoxFuture<'static, ()>) {
        let mut workers = self.workers.lock().await;

        let mut item = Scheduled { delay, job };
        if let Some(sender) = workers.get(session_id) {
            match sender.send(item) {
                Ok(()) => return,
                // Worker finished between lookups; start a new one below.
                Err(mpsc::error::SendError(returned)) => item = returned,
            }
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail.
        let _ = sender.send(item);
        workers.insert(session_id.to_string(), sender);

        tracing::debug!(session_id, "[DelayQueue] Starting worker");
        tokio::spawn(run_worker(
            session_id.to_string(),
            receiver,
            self.workers.clone(),
            self.clock.clone(),
        ));
    }

    /// Number of sessions that currently have queued or running jobs.
    pub async fn active_sessions(&self) -> usize {
        self.workers.lock().await.len()
    }
}

async fn run_worker(
    session_id: String,
    mut receiver: mpsc::UnboundedReceiver<Scheduled>,
    workers: Workers,
    clock: Arc<dyn Clock>,
) {
    loop {
        let next = match receiver.try_recv() {
            Ok(item) => item,
            Err(_) => {
                // Re-check under the registry lock so that a concurrent
                // `schedule` either lands in this receiver or starts a new worker.
                let mut workers = workers.lock().await;
                match receiver.try_recv() {
                    Ok(item) => item,
                    Err(_) => {
                        workers.remove(&session_id);
                        tracing::debug!(session_id = %session_id, "[DelayQueue] Worker idle, exiting");
                        return;
                    }
                }
            }
        };

        if !next.delay.is_zero() {
            clock.sleep(next.delay).await;
        }
        next.job.await;
    }
}
