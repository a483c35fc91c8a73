use std::time::Duration;

use batch_trigger::{Batcher, Limits};
use tokio::time::Instant;

use crate::{
    assert_elapsed, assert_instant,
    types::{items, RecordingProcessor},
};

fn limits(max_batch_size: usize) -> Limits {
    Limits::builder()
        .max_batch_size(max_batch_size)
        .max_wait(Duration::from_secs(60))
        .build()
        .unwrap()
}

/// Given we use a size limit
/// When we add exactly one batch worth of items at once
/// Then they are processed immediately, despite the long time limit
#[tokio::test]
async fn process_when_full() {
    tokio::time::pause();

    let (processor, mut rx) = RecordingProcessor::new();
    let batcher = Batcher::builder()
        .name("process_when_full")
        .processor(processor)
        .limits(limits(3))
        .build();

    let start = Instant::now();
    batcher.add_multiple(items(&["1", "2", "3"])).await;

    assert_eq!(rx.recv().await.unwrap(), items(&["1", "2", "3"]));
    assert_elapsed!(start, Duration::ZERO, Duration::from_millis(2));

    let status = batcher.status().await;
    assert_eq!(status.queue_count, 0);
    assert_eq!(status.processed_count, 3);
    assert_eq!(status.scheduled_processing_time, None);
}

/// Given a batch is waiting for the time limit
/// When it fills up
/// Then the existing schedule is brought forward to now
#[tokio::test]
async fn accelerate_when_full() {
    tokio::time::pause();

    let (processor, mut rx) = RecordingProcessor::new();
    let batcher = Batcher::builder()
        .name("accelerate_when_full")
        .processor(processor)
        .limits(limits(3))
        .build();

    let start = Instant::now();

    batcher.add("1".to_string()).await;
    batcher.add("2".to_string()).await;
    assert_instant!(
        batcher
            .status()
            .await
            .scheduled_processing_time
            .expect("should be scheduled"),
        start + Duration::from_secs(60),
        Duration::from_millis(2)
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    batcher.add("3".to_string()).await;

    assert_instant!(
        batcher
            .status()
            .await
            .scheduled_processing_time
            .expect("should be scheduled"),
        start + Duration::from_millis(10),
        Duration::from_millis(2)
    );

    assert_eq!(rx.recv().await.unwrap(), items(&["1", "2", "3"]));
    assert_elapsed!(start, Duration::from_millis(10), Duration::from_millis(2));
}

/// Given a size limit
/// When more items than the limit are added at once
/// Then they are all processed in one batch
#[tokio::test]
async fn overfull_batch_processed_together() {
    tokio::time::pause();

    let (processor, mut rx) = RecordingProcessor::new();
    let batcher = Batcher::builder()
        .name("overfull_batch_processed_together")
        .processor(processor)
        .limits(limits(2))
        .build();

    batcher.add_multiple(items(&["1", "2", "3", "4", "5"])).await;

    assert_eq!(rx.recv().await.unwrap(), items(&["1", "2", "3", "4", "5"]));
    assert_eq!(batcher.status().await.processed_count, 5);
}

/// Given a size limit
/// When we add several batches worth of items one at a time
/// Then every item gets processed, in order
#[tokio::test]
async fn loaded() {
    tokio::time::pause();

    let processing_dur = Duration::from_millis(5);

    let (processor, mut rx) = RecordingProcessor::new();
    let batcher = Batcher::builder()
        .name("loaded")
        .processor(processor.taking(processing_dur))
        .limits(limits(10))
        .build();

    for i in 1..=100 {
        batcher.add(i.to_string()).await;
    }
    batcher.shut_down().await;

    let mut processed = vec![];
    while let Ok(batch) = rx.try_recv() {
        processed.extend(batch);
    }

    let expected: Vec<String> = (1..=100).map(|i| i.to_string()).collect();
    assert_eq!(processed, expected);
    assert_eq!(batcher.status().await.processed_count, 100);
}
