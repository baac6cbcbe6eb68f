use crate::error::{Error, Result};
use crate::frequency::Symbol;

/// Index of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Reserved value for an absent link.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == NodeId::NONE
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    fn some(self) -> Option<NodeId> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

/// Which child slot of its parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    // Bit emitted for this edge in a code
    #[inline]
    pub fn bit(self) -> bool {
        matches!(self, Side::Right)
    }
}

/// Tree and heap element. Links are arena indices, `NodeId::NONE` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub weight: u64,
    pub symbol: Option<Symbol>,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    pub(crate) parent: NodeId,
}

impl Node {
    pub fn left(&self) -> Option<NodeId> {
        self.left.some()
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right.some()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent.some()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Contiguous storage for every node of one build.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(n: usize) -> Self {
        NodeArena {
            nodes: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        !id.is_none() && id.index() < self.nodes.len()
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else if id.is_none() {
            Err(Error::InvalidArgument("absent node".to_string()))
        } else {
            Err(Error::InvalidArgument(format!(
                "node {} out of range ({} nodes)",
                id.index(),
                self.nodes.len()
            )))
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn leaf(&mut self, symbol: Symbol, weight: u64) -> NodeId {
        self.push(Node {
            weight,
            symbol: Some(symbol),
            left: NodeId::NONE,
            right: NodeId::NONE,
            parent: NodeId::NONE,
        })
    }

    /// Creates an internal node owning `left` and `right`, weighted by their sum.
    pub fn join(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.check(left)?;
        self.check(right)?;
        if left == right {
            return Err(Error::InvalidArgument(
                "node cannot be both children of one parent".to_string(),
            ));
        }
        let weight = self.nodes[left.index()]
            .weight
            .checked_add(self.nodes[right.index()].weight)
            .ok_or(Error::WeightOverflow)?;
        let id = self.push(Node {
            weight,
            symbol: None,
            left: NodeId::NONE,
            right: NodeId::NONE,
            parent: NodeId::NONE,
        });
        self.set_left(id, left)?;
        self.set_right(id, right)?;
        Ok(id)
    }

    pub fn set_left(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.attach(parent, child, Side::Left)
    }

    pub fn set_right(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.attach(parent, child, Side::Right)
    }

    // Passing NodeId::NONE as child clears the slot.
    fn attach(&mut self, parent: NodeId, child: NodeId, side: Side) -> Result<()> {
        self.check(parent)?;
        if !child.is_none() {
            self.check(child)?;
            if child == parent {
                return Err(Error::InvalidArgument("node cannot be its own child".to_string()));
            }
            if self.is_ancestor(child, parent) {
                return Err(Error::InvalidArgument(format!(
                    "node {} is an ancestor of {}",
                    child.index(),
                    parent.index()
                )));
            }
            self.detach(child);
            self.nodes[child.index()].parent = parent;
        }

        let slot = match side {
            Side::Left => &mut self.nodes[parent.index()].left,
            Side::Right => &mut self.nodes[parent.index()].right,
        };
        let previous = std::mem::replace(slot, child);
        if !previous.is_none() && previous != child {
            self.nodes[previous.index()].parent = NodeId::NONE;
        }
        Ok(())
    }

    // True when `ancestor` is on the parent chain of `node`. The walk is capped
    // at the arena size so an already corrupted chain cannot loop forever.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes[node.index()].parent;
        for _ in 0..self.nodes.len() {
            if current.is_none() {
                return false;
            }
            if current == ancestor {
                return true;
            }
            current = self.nodes[current.index()].parent;
        }
        true
    }

    // Unlinks `child` from whichever slot of its current parent holds it
    pub(crate) fn detach(&mut self, child: NodeId) {
        let parent = self.nodes[child.index()].parent;
        if parent.is_none() {
            return;
        }
        let p = &mut self.nodes[parent.index()];
        if p.right == child {
            p.right = NodeId::NONE;
        } else if p.left == child {
            p.left = NodeId::NONE;
        }
        self.nodes[child.index()].parent = NodeId::NONE;
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.index())
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.index())
    }

    // Callers pass ids that came out of this arena
    pub(crate) fn weight(&self, id: NodeId) -> u64 {
        self.nodes[id.index()].weight
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::right)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_leaf)
    }

    /// Slot of `parent` that links back to `child`, if any.
    pub fn side_of(&self, parent: NodeId, child: NodeId) -> Option<Side> {
        let p = self.get(parent)?;
        if p.left == child {
            Some(Side::Left)
        } else if p.right == child {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_links_both_ways() {
        let mut arena = NodeArena::new();
        let a = arena.leaf(b'a' as Symbol, 3);
        let b = arena.leaf(b'b' as Symbol, 4);
        let p = arena.join(a, b).unwrap();

        assert_eq!(arena.weight(p), 7);
        assert_eq!(arena.left(p), Some(a));
        assert_eq!(arena.right(p), Some(b));
        assert_eq!(arena.parent(a), Some(p));
        assert_eq!(arena.parent(b), Some(p));
        assert_eq!(arena.side_of(p, a), Some(Side::Left));
        assert_eq!(arena.side_of(p, b), Some(Side::Right));
        assert!(arena.parent(p).is_none());
        assert!(!arena.is_leaf(p));
        assert!(arena.is_leaf(a));
    }

    #[test]
    fn test_reattach_detaches_from_prior_parent() {
        let mut arena = NodeArena::new();
        let a = arena.leaf(0, 1);
        let b = arena.leaf(1, 1);
        let c = arena.leaf(2, 1);
        let p = arena.join(a, b).unwrap();
        let q = arena.join(c, a).unwrap();

        // a moved from p.left to q.right
        assert_eq!(arena.parent(a), Some(q));
        assert_eq!(arena.left(p), None);
        assert_eq!(arena.right(p), Some(b));
        assert_eq!(arena.side_of(q, a), Some(Side::Right));
        assert_eq!(arena.side_of(p, a), None);
    }

    #[test]
    fn test_replacing_child_clears_old_parent_link() {
        let mut arena = NodeArena::new();
        let a = arena.leaf(0, 1);
        let b = arena.leaf(1, 1);
        let c = arena.leaf(2, 1);
        let p = arena.join(a, b).unwrap();
        arena.set_left(p, c).unwrap();
        assert_eq!(arena.left(p), Some(c));
        assert_eq!(arena.parent(a), None);
        assert_eq!(arena.parent(c), Some(p));
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let mut arena = NodeArena::new();
        let a = arena.leaf(0, 1);
        assert!(matches!(
            arena.join(a, NodeId::NONE),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(arena.join(a, a), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            arena.set_left(NodeId(9), a),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_absent_ids_read_as_none() {
        let mut arena = NodeArena::new();
        let a = arena.leaf(0, 5);
        for id in [NodeId::NONE, NodeId(1), NodeId(u32::MAX - 1)] {
            assert!(!arena.contains(id));
            assert!(arena.get(id).is_none());
            assert!(arena.get_mut(id).is_none());
            assert_eq!(arena.parent(id), None);
            assert_eq!(arena.left(id), None);
            assert_eq!(arena.side_of(id, a), None);
        }
        assert_eq!(arena.get(a).map(|n| n.weight), Some(5));
    }

    #[test]
    fn test_attach_under_descendant_rejected() {
        let mut arena = NodeArena::new();
        let x = arena.leaf(0, 1);
        let y = arena.leaf(1, 1);
        let z = arena.leaf(2, 1);
        let p = arena.join(x, y).unwrap();
        let root = arena.join(p, z).unwrap();

        assert!(matches!(arena.set_left(x, p), Err(Error::InvalidArgument(_))));
        assert!(matches!(arena.set_right(y, root), Err(Error::InvalidArgument(_))));
        // nothing was relinked
        assert_eq!(arena.parent(x), Some(p));
        assert_eq!(arena.left(x), None);
        assert_eq!(arena.parent(p), Some(root));
        assert_eq!(arena.parent(root), None);

        // moving a subtree sideways is still fine
        arena.set_left(z, x).unwrap();
        assert_eq!(arena.parent(x), Some(z));
        assert_eq!(arena.left(p), None);
    }

    #[test]
    fn test_join_weight_overflow() {
        let mut arena = NodeArena::new();
        let a = arena.leaf(0, u64::MAX);
        let b = arena.leaf(1, 1);
        assert!(matches!(arena.join(a, b), Err(Error::WeightOverflow)));
    }
}
