use crate::error::{Error, Result};
use crate::frequency::{FrequencyTable, ALPHABET_SIZE, SENTINEL};
use crate::node::{NodeArena, NodeId};
use crate::queue::PriorityQueue;
use crate::tree::HuffmanTree;

/// Builder phases. Each runs exactly once, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Counting,
    Merging,
    Encoding,
}

/// Owns all state of one tree build: node arena, heap and leaf table.
pub struct TreeBuilder {
    phase: Phase,
    nodes: NodeArena,
    queue: PriorityQueue,
    leaves: Vec<NodeId>,
    merges: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder {
            phase: Phase::Counting,
            // n leaves produce at most n - 1 internal nodes
            nodes: NodeArena::with_capacity(2 * ALPHABET_SIZE - 1),
            queue: PriorityQueue::new(),
            leaves: vec![NodeId::NONE; ALPHABET_SIZE],
            merges: 0,
        }
    }

    /// Runs all three phases over `freq`.
    pub fn build(freq: &FrequencyTable) -> Result<HuffmanTree> {
        let mut builder = TreeBuilder::new();
        builder.populate(freq)?;
        builder.merge()?;
        builder.finish()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn merges(&self) -> usize {
        self.merges
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidPhase {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    /// Creates a leaf for every occurring byte and for the sentinel, and queues them.
    pub fn populate(&mut self, freq: &FrequencyTable) -> Result<()> {
        self.expect_phase(Phase::Counting)?;

        for (symbol, count) in freq.occurring() {
            let leaf = self.nodes.leaf(symbol, count);
            self.leaves[symbol as usize] = leaf;
            self.queue.insert(&self.nodes, leaf)?;
        }
        // The sentinel always gets a leaf, even with weight 0
        let eof = self.nodes.leaf(SENTINEL, freq.count(SENTINEL));
        self.leaves[SENTINEL as usize] = eof;
        self.queue.insert(&self.nodes, eof)?;

        log::debug!(
            "populated {} leaves ({} input bytes)",
            self.queue.len(),
            freq.total()
        );
        self.phase = Phase::Merging;
        Ok(())
    }

    /// Merges the two lightest nodes until one tree remains.
    pub fn merge(&mut self) -> Result<()> {
        self.expect_phase(Phase::Merging)?;

        while self.queue.len() > 1 {
            let a = self.queue.extract_min(&self.nodes)?;
            let b = self.queue.extract_min(&self.nodes)?;
            let joined = self.nodes.join(a, b)?;
            log::trace!(
                "merge {} (w={}) + {} (w={}) -> {} (w={})",
                a.index(),
                self.nodes.weight(a),
                b.index(),
                self.nodes.weight(b),
                joined.index(),
                self.nodes.weight(joined)
            );
            self.queue.insert(&self.nodes, joined)?;
            self.merges += 1;
            debug_assert!(self.queue.is_valid_heap(&self.nodes));
        }

        log::debug!("merged tree in {} steps", self.merges);
        self.phase = Phase::Encoding;
        Ok(())
    }

    /// Hands the finished tree over for code generation.
    pub fn finish(mut self) -> Result<HuffmanTree> {
        self.expect_phase(Phase::Encoding)?;
        let root = self.queue.extract_min(&self.nodes)?;
        Ok(HuffmanTree::new(self.nodes, root, self.leaves))
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
