use std::{collections::HashMap, fmt::Debug};

use crate::processor::Processor;

/// The batch in progress.
pub(crate) enum Queue<P: Processor> {
    /// Items in insertion order, duplicates allowed.
    Plain(Vec<P::Item>),
    /// At most one item per key.
    ///
    /// `items` is ordered by the first insertion of each key. Adding an item with a key that is
    /// already queued replaces the value in place.
    Deduplicated {
        items: Vec<P::Item>,
        positions: HashMap<P::Key, usize>,
    },
}

impl<P: Processor> Debug for Queue<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Queue::Plain(items) => f.debug_struct("Plain").field("len", &items.len()).finish(),
            Queue::Deduplicated { items, .. } => f
                .debug_struct("Deduplicated")
                .field("len", &items.len())
                .finish(),
        }
    }
}

impl<P: Processor> Queue<P> {
    pub(crate) fn new(deduplicate: bool) -> Self {
        if deduplicate {
            Queue::Deduplicated {
                items: Vec::new(),
                positions: HashMap::new(),
            }
        } else {
            Queue::Plain(Vec::new())
        }
    }

    /// The number of pending items, or distinct keys when deduplicating.
    pub(crate) fn len(&self) -> usize {
        self.items().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn push(&mut self, processor: &P, item: P::Item) {
        match self {
            Queue::Plain(items) => items.push(item),
            Queue::Deduplicated { items, positions } => {
                let key = processor.key(&item);
                match positions.get(&key) {
                    Some(&position) => items[position] = item,
                    None => {
                        positions.insert(key, items.len());
                        items.push(item);
                    }
                }
            }
        }
    }

    /// A copy of the pending items, in queue order.
    pub(crate) fn snapshot(&self) -> Vec<P::Item> {
        self.items().to_vec()
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Queue::Plain(items) => items.clear(),
            Queue::Deduplicated { items, positions } => {
                items.clear();
                positions.clear();
            }
        }
    }

    fn items(&self) -> &[P::Item] {
        match self {
            Queue::Plain(items) => items,
            Queue::Deduplicated { items, .. } => items,
        }
    }
}
