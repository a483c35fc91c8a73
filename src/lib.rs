//! Accumulate work items and process them together.
//!
//! Sometimes it is more efficient to process many items at once rather than one at a time.
//! Especially when the processing step has overheads which can be shared between many items, e.g.
//! a network round trip.
//!
//! A [`Batcher`] queues items as they are added. The queue is handed to a [`Processor`] once it
//! reaches a maximum size, or a maximum wait time after the first item was added, whichever comes
//! first. Latency is bounded, while many items share the cost of one processing call.
//!
//! Processing runs on a separate task, provided by a [`Scheduler`]. At most one batch is processed
//! at a time. If processing fails, the batch stays queued and is retried, along with any new items,
//! the next time processing is triggered.
//!
//! Optionally, items can be deduplicated by key. A newer item replaces an older one with the same
//! key, keeping its place in the queue.
//!
//! See the README for an example.

#![deny(missing_docs)]

#[cfg(doctest)]
use doc_comment::doctest;
#[cfg(doctest)]
doctest!("../README.md");

mod batcher;
mod engine;
pub mod error;
mod limits;
mod policy;
mod processor;
mod queue;
pub mod scheduler;

pub use batcher::{Batcher, Status};
pub use error::ConfigError;
pub use limits::{Limits, DEFAULT_MAX_WAIT};
pub use processor::Processor;
pub use scheduler::{ScheduledTask, Scheduler, TokioScheduler};
