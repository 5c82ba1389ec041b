use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct QueueItem<T> {
    priority: f64,
    item: T,
}

impl<T> PartialEq for QueueItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<T> Eq for QueueItem<T> {}

impl<T> PartialOrd for QueueItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueueItem<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for Min-Heap behavior
        other.priority.total_cmp(&self.priority)
    }
}

/// Min-priority queue of `(box distance, subtree)` pairs.
///
/// Extraction order is non-decreasing in priority, which is what makes the
/// priority search termination test sound.
pub struct BoxPriorityQueue<T> {
    heap: BinaryHeap<QueueItem<T>>,
}

impl<T> BoxPriorityQueue<T> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    /// Pre-sizes the queue; the number of nodes in the tree is always enough.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { heap: BinaryHeap::with_capacity(capacity) }
    }

    #[inline]
    pub fn insert(&mut self, priority: f64, item: T) {
        self.heap.push(QueueItem { priority, item });
    }

    /// Removes the entry with the lowest priority, `None` once the queue is empty.
    #[inline]
    pub fn extract_min(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|e| (e.priority, e.item))
    }

    #[inline]
    pub fn non_empty(&self) -> bool {
        !self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for BoxPriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_queue() {
        let mut q: BoxPriorityQueue<u32> = BoxPriorityQueue::new();
        assert!(!q.non_empty());
        assert_eq!(q.extract_min(), None);
    }

    #[test]
    fn test_extracts_lowest_first() {
        let mut q = BoxPriorityQueue::with_capacity(4);
        q.insert(3.0, "c");
        q.insert(0.0, "a");
        q.insert(1.5, "b");
        assert_eq!(q.len(), 3);
        assert_eq!(q.extract_min(), Some((0.0, "a")));
        assert_eq!(q.extract_min(), Some((1.5, "b")));
        assert_eq!(q.extract_min(), Some((3.0, "c")));
        assert!(q.is_empty());
    }

    #[test]
    fn test_interleaved_extractions_non_decreasing() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut q = BoxPriorityQueue::new();
        let mut last = f64::NEG_INFINITY;
        for step in 0..2000usize {
            // Pushes never go below the last popped key, as in a priority search
            // where children are never closer than their parent box.
            if rng.gen_bool(0.6) || !q.non_empty() {
                let base = if last.is_finite() { last } else { 0.0 };
                q.insert(base + rng.gen_range(0.0..100.0), step);
            } else {
                let (p, _) = q.extract_min().unwrap();
                assert!(p >= last, "extracted {} after {}", p, last);
                last = p;
            }
        }
        while let Some((p, _)) = q.extract_min() {
            assert!(p >= last);
            last = p;
        }
    }
}
