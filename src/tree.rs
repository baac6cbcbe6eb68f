use crate::error::{Error, Result};
use crate::frequency::{Symbol, ALPHABET_SIZE, SENTINEL};
use crate::node::{Node, NodeArena, NodeId};

/// A finished Huffman tree: the node arena, its root and the per-symbol leaf table.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: NodeArena,
    root: NodeId,
    leaves: Vec<NodeId>, // indexed by symbol, NodeId::NONE when the symbol never occurred
}

impl HuffmanTree {
    pub(crate) fn new(nodes: NodeArena, root: NodeId, leaves: Vec<NodeId>) -> Self {
        debug_assert_eq!(leaves.len(), ALPHABET_SIZE);
        HuffmanTree {
            nodes,
            root,
            leaves,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut NodeArena {
        &mut self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn leaf(&self, symbol: Symbol) -> Option<NodeId> {
        self.leaves
            .get(symbol as usize)
            .copied()
            .filter(|id| !id.is_none())
    }

    pub fn sentinel(&self) -> Option<NodeId> {
        self.leaf(SENTINEL)
    }

    /// Leaves in ascending symbol order.
    pub fn leaves(&self) -> impl Iterator<Item = (Symbol, NodeId)> + '_ {
        self.leaves
            .iter()
            .enumerate()
            .filter(|(_, id)| !id.is_none())
            .map(|(s, &id)| (s as Symbol, id))
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn node_count(&self) -> usize {
        self.post_order().len()
    }

    /// Nodes reachable from the root, children before parents.
    ///
    /// Uses an explicit stack so depth is bounded only by heap memory.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.get(self.root).is_none() {
            return out;
        }
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            if let Some(r) = self.nodes.right(id) {
                stack.push((r, false));
            }
            if let Some(l) = self.nodes.left(id) {
                stack.push((l, false));
            }
        }
        out
    }

    /// Every node has zero or two children.
    pub fn is_full(&self) -> bool {
        self.post_order().into_iter().all(|id| {
            let n = self.nodes.get(id);
            matches!(
                n.map(|n| (n.left(), n.right())),
                Some((None, None)) | Some((Some(_), Some(_)))
            )
        })
    }

    /// weight(internal) == weight(left) + weight(right) everywhere.
    pub fn check_weights(&self) -> bool {
        self.post_order().into_iter().all(|id| {
            match (self.nodes.left(id), self.nodes.right(id)) {
                (Some(l), Some(r)) => self
                    .nodes
                    .weight(l)
                    .checked_add(self.nodes.weight(r))
                    .is_some_and(|sum| sum == self.nodes.weight(id)),
                _ => true,
            }
        })
    }

    /// Checks linkage, fullness, weights, and that the leaf table matches the tree.
    pub fn verify(&self) -> Result<()> {
        if self.nodes.parent(self.root).is_some() {
            return Err(Error::CorruptTree("root has a parent".to_string()));
        }
        let order = self.post_order();
        let mut seen = vec![false; self.nodes.len()];
        for &id in &order {
            if std::mem::replace(&mut seen[id.index()], true) {
                return Err(Error::CorruptTree(format!("node {} reached twice", id.index())));
            }
            if id != self.root {
                let parent = self
                    .nodes
                    .parent(id)
                    .ok_or_else(|| Error::CorruptTree(format!("node {} has no parent", id.index())))?;
                self.nodes.side_of(parent, id).ok_or(Error::BrokenLink(id))?;
            }
        }
        if !self.is_full() {
            return Err(Error::CorruptTree("node with a single child".to_string()));
        }
        if !self.check_weights() {
            return Err(Error::CorruptTree("internal weight is not the sum of its children".to_string()));
        }

        let reachable_leaves = order.iter().filter(|&&id| self.nodes.is_leaf(id)).count();
        if reachable_leaves != self.leaf_count() {
            return Err(Error::CorruptTree(format!(
                "{} leaves reachable, {} in leaf table",
                reachable_leaves,
                self.leaf_count()
            )));
        }
        for (symbol, id) in self.leaves() {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| Error::CorruptTree(format!("missing leaf for symbol {}", symbol)))?;
            if node.symbol != Some(symbol) || !seen[id.index()] {
                return Err(Error::CorruptTree(format!("leaf table entry {} is stale", symbol)));
            }
        }
        Ok(())
    }

    /// Tears the tree down children-first and returns the number of nodes released.
    pub fn release(mut self) -> usize {
        let order = self.post_order();
        for &id in &order {
            // both children were unlinked earlier in the walk
            debug_assert!(self.nodes.is_leaf(id));
            self.nodes.detach(id);
        }
        log::trace!("released {} nodes", order.len());
        self.leaves.iter_mut().for_each(|id| *id = NodeId::NONE);
        self.nodes.clear();
        self.root = NodeId::NONE;
        order.len()
    }
}
