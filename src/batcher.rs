use std::{
    fmt::{self, Display},
    sync::Arc,
};

use bon::bon;
use tokio::time::Instant;

use crate::{
    engine::Engine,
    limits::Limits,
    processor::Processor,
    scheduler::{Scheduler, TokioScheduler},
};

/// Groups items to be processed in batches.
///
/// Items are queued until either the batch reaches [`Limits::max_batch_size`], or
/// [`Limits::max_wait`] has passed since the first item was added to an empty batch. The whole
/// batch is then passed to the [`Processor`] on a separate task.
///
/// Only one batch is processed at a time. While a batch is processing, calls to [`add`] wait for
/// it to finish.
///
/// If processing fails, the items stay queued. They will be processed again, together with any
/// items added in the meantime, next time processing is triggered.
///
/// Cheap to clone. Cloned instances share the same queue.
///
/// [`add`]: Batcher::add
#[derive(Debug)]
pub struct Batcher<P: Processor> {
    engine: Arc<Engine<P>>,
}

/// A point-in-time view of a [`Batcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Status {
    /// The number of items waiting to be processed.
    ///
    /// When deduplicating, this is the number of distinct keys.
    pub queue_count: usize,
    /// The number of items processed successfully so far.
    pub processed_count: u64,
    /// When the pending batch is expected to be processed. `None` if nothing is scheduled.
    pub scheduled_processing_time: Option<Instant>,
}

#[bon]
impl<P: Processor> Batcher<P> {
    /// Create a new batcher.
    ///
    /// Unless a `scheduler` is given, processing runs on the Tokio runtime this is called from.
    ///
    /// # Panics
    ///
    /// Panics if no `scheduler` is given and this is called outside of a Tokio runtime.
    #[builder]
    pub fn new(
        name: impl Into<String>,
        processor: P,
        #[builder(default)] limits: Limits,
        /// Keep at most one item per [`Processor::key`], replacing earlier items with the same key.
        #[builder(default)]
        deduplicate: bool,
        scheduler: Option<Arc<dyn Scheduler>>,
    ) -> Self {
        let scheduler = scheduler.unwrap_or_else(|| Arc::new(TokioScheduler::current()));

        Self {
            engine: Arc::new(Engine::new(
                name.into(),
                processor,
                limits,
                deduplicate,
                scheduler,
            )),
        }
    }

    /// Add an item to be batched.
    ///
    /// Returns once the item is queued. Processing happens later, on another task.
    pub async fn add(&self, item: P::Item) {
        self.engine.add([item]).await;
    }

    /// Add several items at once.
    ///
    /// Processing is scheduled (or brought forward) at most once, after all items are queued.
    /// Adding no items does nothing.
    pub async fn add_multiple(&self, items: impl IntoIterator<Item = P::Item>) {
        self.engine.add(items).await;
    }

    /// A consistent snapshot of the queue size, processed count and next processing time.
    pub async fn status(&self) -> Status {
        let state = self.engine.lock().await;

        Status {
            queue_count: state.queue.len(),
            processed_count: state.processed,
            scheduled_processing_time: state.scheduled.as_ref().map(|scheduled| scheduled.at),
        }
    }

    /// A copy of the items waiting to be processed, in the order they would be processed.
    pub async fn inspect_queue(&self) -> Vec<P::Item> {
        self.engine.lock().await.queue.snapshot()
    }

    /// Process any pending batch immediately, and wait for processing to finish.
    ///
    /// Returns immediately if nothing is scheduled. Can be called more than once.
    pub async fn shut_down(&self) {
        self.engine.shut_down().await;
    }

    /// The name given to this batcher.
    pub fn name(&self) -> &str {
        self.engine.name()
    }
}

impl<P: Processor> Clone for Batcher<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "queued: {}, processed: {}",
            self.queue_count, self.processed_count
        )?;
        match self.scheduled_processing_time {
            Some(at) => write!(
                f,
                ", processing in {}ms",
                at.saturating_duration_since(Instant::now()).as_millis()
            ),
            None => write!(f, ", nothing scheduled"),
        }
    }
}
