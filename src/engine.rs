use std::{
    fmt::Debug,
    ops::{Deref, DerefMut},
    panic::AssertUnwindSafe,
    sync::Arc,
    time::Duration,
};

use futures::FutureExt;
use tokio::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use tracing::{debug, error, info, span, Instrument, Level};

use crate::{
    error::{ProcessingError, ProcessingResult},
    policy::{self, OnAdd},
    processor::Processor,
    queue::Queue,
    scheduler::{ScheduledTask, Scheduler},
    Limits,
};

/// The batching engine, shared between all clones of a `Batcher`.
pub(crate) struct Engine<P: Processor> {
    name: String,
    processor: P,
    limits: Limits,
    scheduler: Arc<dyn Scheduler>,

    state: Mutex<State<P>>,
}

/// Everything that changes. Only ever touched while holding the lock.
#[derive(Debug)]
pub(crate) struct State<P: Processor> {
    pub(crate) queue: Queue<P>,
    /// The number of items successfully processed so far.
    pub(crate) processed: u64,
    /// The pending processing task, if any.
    pub(crate) scheduled: Option<Scheduled>,
}

#[derive(Debug)]
pub(crate) struct Scheduled {
    task: Box<dyn ScheduledTask>,
    /// When the task is expected to run.
    pub(crate) at: Instant,
}

impl Scheduled {
    fn reschedule(&mut self, delay: Duration) {
        self.task.reschedule(delay);
        self.at = Instant::now() + delay;
    }
}

impl<P: Processor> Debug for Engine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("limits", &self.limits)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl<P: Processor> Engine<P> {
    pub(crate) fn new(
        name: String,
        processor: P,
        limits: Limits,
        deduplicate: bool,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            name,
            processor,
            limits,
            scheduler,
            state: Mutex::new(State {
                queue: Queue::new(deduplicate),
                processed: 0,
                scheduled: None,
            }),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Wait for exclusive access to the state.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, State<P>> {
        self.state.lock().await
    }

    /// Add items, then decide whether to schedule processing.
    ///
    /// Both happen under one lock, so every item added here is part of the batch that the decision
    /// eventually processes.
    pub(crate) async fn add(self: &Arc<Self>, items: impl IntoIterator<Item = P::Item>) {
        let mut state = self.lock().await;

        // A replacement can leave the length unchanged, so count pushes rather than comparing it.
        let mut added = false;
        for item in items {
            state.queue.push(&self.processor, item);
            added = true;
        }

        if !added {
            return;
        }

        self.schedule(&mut state);
    }

    fn schedule(self: &Arc<Self>, state: &mut State<P>) {
        let queue_len = state.queue.len();

        match policy::on_add(&self.limits, queue_len, state.scheduled.is_some()) {
            OnAdd::ProcessAfter(delay) => {
                debug!(
                    batch.name = self.name(),
                    batch.size = queue_len as u64,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling batch processing"
                );

                let task = self
                    .scheduler
                    .schedule_after(delay, Box::pin(Arc::clone(self).process()));

                state.scheduled = Some(Scheduled {
                    task,
                    at: Instant::now() + delay,
                });
            }
            OnAdd::ProcessNow => {
                debug!(
                    batch.name = self.name(),
                    batch.size = queue_len as u64,
                    "Batch is full, processing now"
                );

                if let Some(scheduled) = state.scheduled.as_mut() {
                    scheduled.reschedule(Duration::ZERO);
                }
            }
            OnAdd::DoNothing => {}
        }
    }

    /// The body of a scheduled processing task.
    ///
    /// Holds the lock for the whole run, so anything trying to add items waits until the processor
    /// has finished.
    ///
    /// Only uses runtime-agnostic primitives, so it can be driven by any [`Scheduler`].
    async fn process(self: Arc<Self>) {
        let mut state = ScheduledSlot(self.lock().await);

        if state.queue.is_empty() {
            debug!(batch.name = self.name(), "Nothing to process");
        } else {
            let items = state.queue.snapshot();
            let batch_size = items.len();

            let span = span!(
                Level::INFO,
                "process batch",
                batch.name = self.name(),
                batch.size = batch_size as u64
            );

            match self.invoke(items).instrument(span).await {
                Ok(()) => {
                    state.processed += batch_size as u64;
                    state.queue.clear();
                }
                Err(err) => {
                    error!(
                        batch.name = self.name(),
                        batch.size = batch_size as u64,
                        error = %err,
                        details = ?err,
                        "Failed to process batch, keeping items queued"
                    );
                }
            }
        }
    }

    async fn invoke(&self, items: Vec<P::Item>) -> ProcessingResult<P::Error> {
        AssertUnwindSafe(self.processor.process(items))
            .catch_unwind()
            .await
            .map_err(ProcessingError::from_panic)?
            .map_err(ProcessingError::BatchFailed)
    }

    /// Process any pending batch now and wait for it to finish.
    pub(crate) async fn shut_down(&self) {
        let completion = {
            let mut guard = self.lock().await;
            let state = &mut *guard;

            match state.scheduled.as_mut() {
                Some(scheduled) => {
                    info!(
                        batch.name = self.name(),
                        batch.size = state.queue.len() as u64,
                        "Processing pending batch before shutting down"
                    );
                    scheduled.reschedule(Duration::ZERO);
                    scheduled.task.completion()
                }
                None => return,
            }
        };

        completion.await;
    }
}

/// The state, held by a running processing task.
///
/// Frees the scheduled slot when dropped, including when the task is dropped or unwinds part way
/// through.
struct ScheduledSlot<'a, P: Processor>(MutexGuard<'a, State<P>>);

impl<P: Processor> Deref for ScheduledSlot<'_, P> {
    type Target = State<P>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P: Processor> DerefMut for ScheduledSlot<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<P: Processor> Drop for ScheduledSlot<'_, P> {
    fn drop(&mut self) {
        self.0.scheduled = None;
    }
}
