//! Indexed binary min-heap with decrease-key
//!
//! Keys are dense vertex identifiers, so the reverse lookup from key to heap
//! position is a flat vector. Each key is present at most once; pushing a
//! key that is already queued with a smaller priority lowers its priority
//! in place instead of inserting a duplicate.

use std::fmt::Debug;

use crate::algorithm::NodeId;

#[derive(Debug, Clone)]
struct HeapEntry<P> {
    id: NodeId,
    priority: P,
}

/// Indexed binary heap ordered by ascending priority
#[derive(Debug, Clone)]
pub(crate) struct IndexedPriorityQueue<P: Ord + Copy + Debug> {
    heap: Vec<HeapEntry<P>>,
    /// Heap position of every key, `None` when not queued
    positions: Vec<Option<usize>>,
}

impl<P: Ord + Copy + Debug> IndexedPriorityQueue<P> {
    /// Creates a queue accepting keys in `0..capacity`
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, id: NodeId) -> bool {
        self.positions[id].is_some()
    }

    /// Inserts `id`, or lowers its priority if it is queued with a larger
    /// one. Returns whether the queue changed.
    pub fn push_or_decrease(&mut self, id: NodeId, priority: P) -> bool {
        match self.positions[id] {
            Some(position) => {
                if priority >= self.heap[position].priority {
                    return false;
                }
                self.heap[position].priority = priority;
                self.sift_up(position);
            }
            None => {
                let position = self.heap.len();
                self.heap.push(HeapEntry { id, priority });
                self.positions[id] = Some(position);
                self.sift_up(position);
            }
        }
        true
    }

    /// Removes the entry with the smallest priority
    pub fn pop(&mut self) -> Option<(NodeId, P)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let root = self.heap.pop()?;
        self.positions[root.id] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((root.id, root.priority))
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.heap[position].priority >= self.heap[parent].priority {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut smallest = position;
            if left < len && self.heap[left].priority < self.heap[smallest].priority {
                smallest = left;
            }
            if right < len && self.heap[right].priority < self.heap[smallest].priority {
                smallest = right;
            }
            if smallest == position {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a].id] = Some(a);
        self.positions[self.heap[b].id] = Some(b);
    }
}
