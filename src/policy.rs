//! Deciding when a batch gets processed.

use std::time::Duration;

use crate::Limits;

/// Action to take after adding items to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnAdd {
    /// Nothing is scheduled yet. Schedule processing after the given delay.
    ProcessAfter(Duration),
    /// Processing is already scheduled, but the batch is now full. Bring it forward to now.
    ProcessNow,
    /// Processing is already scheduled. Keep the original deadline.
    DoNothing,
}

/// Should be applied _after_ adding the new items to the queue.
pub(crate) fn on_add(limits: &Limits, queue_len: usize, scheduled: bool) -> OnAdd {
    let full = limits.is_full(queue_len);

    match (scheduled, full) {
        (false, true) => OnAdd::ProcessAfter(Duration::ZERO),
        (false, false) => OnAdd::ProcessAfter(limits.max_wait),
        (true, true) => OnAdd::ProcessNow,
        (true, false) => OnAdd::DoNothing,
    }
}
