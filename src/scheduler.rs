//! Running tasks after a delay.
//!
//! The batcher doesn't own a timer. It hands its processing task to a [`Scheduler`], and keeps the
//! returned [`ScheduledTask`] so it can bring the deadline forward when a batch fills up, or wait
//! for the task to finish on shutdown.

use std::{fmt::Debug, time::Duration};

use futures::future::BoxFuture;
use tokio::{runtime::Handle, sync::watch, time::Instant};
use tracing::instrument::WithSubscriber;

/// Runs tasks after a delay, on tasks separate from the caller.
pub trait Scheduler: Debug + Send + Sync + 'static {
    /// Run `task` once `delay` has elapsed.
    fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>)
        -> Box<dyn ScheduledTask>;
}

/// A handle to a task created by a [`Scheduler`].
///
/// Dropping the handle does not cancel the task.
pub trait ScheduledTask: Debug + Send + Sync {
    /// Change the task to run `delay` from now instead of at its original time.
    ///
    /// Has no effect once the task has started running.
    fn reschedule(&self, delay: Duration);

    /// Resolves once the task has finished running.
    ///
    /// Also resolves if the task was torn down without running, e.g. because the runtime shut down.
    fn completion(&self) -> BoxFuture<'static, ()>;
}

/// A [`Scheduler`] which spawns tasks onto a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

#[derive(Debug)]
struct TokioTask {
    deadline_tx: watch::Sender<Instant>,
    done_rx: watch::Receiver<bool>,
}

impl TokioScheduler {
    /// Spawn tasks onto the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Spawn tasks onto the runtime we're currently running in.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(
        &self,
        delay: Duration,
        task: BoxFuture<'static, ()>,
    ) -> Box<dyn ScheduledTask> {
        let (deadline_tx, mut deadline_rx) = watch::channel(Instant::now() + delay);
        let (done_tx, done_rx) = watch::channel(false);

        self.runtime.spawn(
            async move {
                loop {
                    let deadline = *deadline_rx.borrow_and_update();
                    tokio::select! {
                        () = tokio::time::sleep_until(deadline) => break,
                        changed = deadline_rx.changed() => {
                            if changed.is_err() {
                                // The handle was dropped, so the deadline can't change any more.
                                tokio::time::sleep_until(deadline).await;
                                break;
                            }
                        }
                    }
                }

                task.await;

                done_tx.send_replace(true);
            }
            .with_current_subscriber(),
        );

        Box::new(TokioTask {
            deadline_tx,
            done_rx,
        })
    }
}

impl ScheduledTask for TokioTask {
    fn reschedule(&self, delay: Duration) {
        self.deadline_tx.send_replace(Instant::now() + delay);
    }

    fn completion(&self) -> BoxFuture<'static, ()> {
        let mut done_rx = self.done_rx.clone();
        Box::pin(async move {
            // An error means the task was dropped without finishing. Either way, it's not running.
            let _ = done_rx.wait_for(|done| *done).await;
        })
    }
}
