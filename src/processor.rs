use std::{
    fmt::{Debug, Display},
    future::Future,
    hash::Hash,
};

/// Process a batch of items.
///
/// Should be cheap to clone.
pub trait Processor: 'static + Send + Sync + Clone {
    /// The work item type.
    ///
    /// Each processing run gets its own copy of the batch, so items must be cloneable.
    type Item: 'static + Clone + Send + Sync;
    /// The key used to deduplicate items.
    ///
    /// Only used when the batcher is built with `deduplicate(true)`. To deduplicate items by
    /// equality, use `type Key = Self::Item` and return a clone of the item from [`key`].
    ///
    /// [`key`]: Processor::key
    type Key: 'static + Debug + Eq + Hash + Send + Sync;
    /// The error type that can be returned when processing a batch.
    type Error: 'static + Send + Display + Debug;

    /// The deduplication key for an item. Two items are duplicates if their keys are equal.
    fn key(&self, item: &Self::Item) -> Self::Key;

    /// Process the batch.
    ///
    /// Returning an error leaves the whole batch queued. It will be passed to the processor again,
    /// along with any newly added items, the next time processing is triggered.
    fn process(
        &self,
        items: Vec<Self::Item>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
