// Array-backed binary min-heap of node references, ordered by node weight.
//
// Slot i has children 2i+1 and 2i+2 and parent (i-1)/2. The queue does not own
// the nodes; it holds arena indices while the tree is being merged.

use crate::error::{Error, Result};
use crate::frequency::ALPHABET_SIZE;
use crate::node::{NodeArena, NodeId};

#[inline]
fn parent(i: usize) -> usize {
    (i - 1) / 2
}

#[inline]
fn left(i: usize) -> usize {
    2 * i + 1
}

#[inline]
fn right(i: usize) -> usize {
    2 * i + 2
}

#[derive(Debug, Clone)]
pub struct PriorityQueue {
    slots: Vec<NodeId>,
    capacity: usize,
}

impl PriorityQueue {
    /// Queue sized for every byte value plus the sentinel.
    pub fn new() -> Self {
        Self::with_capacity(ALPHABET_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PriorityQueue {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.slots.first().copied()
    }

    pub fn insert(&mut self, nodes: &NodeArena, node: NodeId) -> Result<()> {
        if !nodes.contains(node) {
            return Err(Error::InvalidArgument(format!(
                "cannot queue absent node {:?}",
                node
            )));
        }
        if self.slots.len() >= self.capacity {
            return Err(Error::CapacityExceeded(self.capacity));
        }

        let mut i = self.slots.len();
        self.slots.push(node);

        // Sift up while strictly lighter than the parent
        while i > 0 {
            let p = parent(i);
            if nodes.weight(self.slots[i]) < nodes.weight(self.slots[p]) {
                self.slots.swap(i, p);
                i = p;
            } else {
                break;
            }
        }
        Ok(())
    }

    pub fn extract_min(&mut self, nodes: &NodeArena) -> Result<NodeId> {
        if self.slots.is_empty() {
            return Err(Error::EmptyQueue);
        }
        let min = self.slots.swap_remove(0);
        self.sift_down(nodes, 0);
        Ok(min)
    }

    fn sift_down(&mut self, nodes: &NodeArena, mut i: usize) {
        let n = self.slots.len();
        while left(i) < n {
            let l = left(i);
            let r = right(i);
            // Ties go to the left child
            let smaller = if r < n && nodes.weight(self.slots[r]) < nodes.weight(self.slots[l]) {
                r
            } else {
                l
            };
            if nodes.weight(self.slots[i]) > nodes.weight(self.slots[smaller]) {
                self.slots.swap(i, smaller);
                i = smaller;
            } else {
                break;
            }
        }
    }

    /// Checks weight(slot[i]) >= weight(slot[parent(i)]) for every non-root slot.
    pub fn is_valid_heap(&self, nodes: &NodeArena) -> bool {
        (1..self.slots.len())
            .all(|i| nodes.weight(self.slots[i]) >= nodes.weight(self.slots[parent(i)]))
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().copied()
    }
}

impl Default for PriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn arena_with(weights: &[u64]) -> (NodeArena, Vec<NodeId>) {
        let mut arena = NodeArena::new();
        let ids = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| arena.leaf(i as u16, w))
            .collect();
        (arena, ids)
    }

    #[test]
    fn test_extracts_in_weight_order() {
        let (arena, ids) = arena_with(&[5, 1, 9, 3, 3, 0, 7]);
        let mut queue = PriorityQueue::new();
        for &id in &ids {
            queue.insert(&arena, id).unwrap();
            assert!(queue.is_valid_heap(&arena));
        }
        assert_eq!(queue.len(), 7);

        let mut weights = Vec::new();
        while !queue.is_empty() {
            let id = queue.extract_min(&arena).unwrap();
            weights.push(arena.weight(id));
            assert!(queue.is_valid_heap(&arena));
        }
        assert_eq!(weights, vec![0, 1, 3, 3, 5, 7, 9]);
    }

    #[test]
    fn test_extract_from_empty_queue() {
        let arena = NodeArena::new();
        let mut queue = PriorityQueue::new();
        assert!(matches!(queue.extract_min(&arena), Err(Error::EmptyQueue)));
    }

    #[test]
    fn test_insert_absent_node() {
        let (arena, _) = arena_with(&[1]);
        let mut queue = PriorityQueue::new();
        assert!(matches!(
            queue.insert(&arena, NodeId::NONE),
            Err(Error::InvalidArgument(_))
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let (arena, ids) = arena_with(&[1, 2, 3]);
        let mut queue = PriorityQueue::with_capacity(2);
        queue.insert(&arena, ids[0]).unwrap();
        queue.insert(&arena, ids[1]).unwrap();
        assert!(matches!(
            queue.insert(&arena, ids[2]),
            Err(Error::CapacityExceeded(2))
        ));
    }

    #[test]
    fn test_equal_weights_prefer_left_child() {
        let (arena, ids) = arena_with(&[0, 1, 1, 5]);
        let mut queue = PriorityQueue::new();
        for &id in &ids {
            queue.insert(&arena, id).unwrap();
        }
        assert_eq!(queue.extract_min(&arena).unwrap(), ids[0]);
        // ids[3] sinks from the root; the tied children resolve to the left one
        assert_eq!(queue.peek(), Some(ids[1]));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![ids[1], ids[3], ids[2]]);
    }

    #[test]
    fn test_random_weights_stay_heap_ordered() {
        let mut rng = rand::thread_rng();
        let weights: Vec<u64> = (0..257).map(|_| rng.gen_range(0..50)).collect();
        let (arena, ids) = arena_with(&weights);
        let mut queue = PriorityQueue::new();
        for &id in &ids {
            queue.insert(&arena, id).unwrap();
        }
        assert!(matches!(
            queue.insert(&arena, ids[0]),
            Err(Error::CapacityExceeded(257))
        ));

        let mut last = 0;
        while let Ok(id) = queue.extract_min(&arena) {
            let w = arena.weight(id);
            assert!(w >= last);
            last = w;
        }
    }
}
