use crate::error::{Error, Result};
use crate::frequency::{Symbol, SENTINEL};
use crate::node::NodeId;
use crate::tree::HuffmanTree;
use bitvec::prelude::*;
use std::collections::BTreeMap;

/// A code's bits, root edge first. Left edges are 0, right edges 1.
pub type Code = BitVec<u8, Msb0>;

/// Derives the code of `leaf` by walking its parent chain up to the root.
///
/// The root's code is empty, so a tree made of a single leaf yields an empty code.
pub fn code_for(tree: &HuffmanTree, leaf: NodeId) -> Result<Code> {
    let nodes = tree.nodes();
    if !nodes.contains(leaf) {
        return Err(Error::InvalidArgument(format!("no such node {:?}", leaf)));
    }

    let mut code = Code::new();
    let mut current = leaf;
    while let Some(parent) = nodes.parent(current) {
        let side = nodes.side_of(parent, current).ok_or(Error::BrokenLink(current))?;
        code.push(side.bit());
        current = parent;
    }
    if current != tree.root() {
        return Err(Error::CorruptTree(format!(
            "node {} does not lead to the root",
            leaf.index()
        )));
    }

    // bits were collected leaf-first
    code.reverse();
    Ok(code)
}

/// Weight and code of one symbol, as handed to the packer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub weight: u64,
    pub code: Code,
}

/// Code of every symbol that has a leaf in the tree.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    entries: BTreeMap<Symbol, CodeEntry>,
}

impl CodeTable {
    pub fn generate(tree: &HuffmanTree) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (symbol, leaf) in tree.leaves() {
            let code = code_for(tree, leaf)?;
            let weight = tree.nodes().weight(leaf);
            entries.insert(symbol, CodeEntry { weight, code });
        }
        Ok(CodeTable { entries })
    }

    pub fn get(&self, symbol: Symbol) -> Option<&CodeEntry> {
        self.entries.get(&symbol)
    }

    pub fn code(&self, symbol: Symbol) -> Option<&BitSlice<u8, Msb0>> {
        self.entries.get(&symbol).map(|e| e.code.as_bitslice())
    }

    pub fn sentinel(&self) -> Option<&CodeEntry> {
        self.get(SENTINEL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &CodeEntry)> {
        self.entries.iter().map(|(&s, e)| (s, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<&Code> = self.entries.values().map(|e| &e.code).collect();
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                if a.starts_with(b.as_bitslice()) || b.starts_with(a.as_bitslice()) {
                    return false;
                }
            }
        }
        true
    }

    /// Bits needed for the payload: sum of weight * code length.
    ///
    /// Fails with [`Error::WeightOverflow`] when the total does not fit in a `u64`.
    pub fn payload_bits(&self) -> Result<u64> {
        self.entries.values().try_fold(0u64, |total, e| {
            e.weight
                .checked_mul(e.code.len() as u64)
                .and_then(|bits| total.checked_add(bits))
                .ok_or(Error::WeightOverflow)
        })
    }

    pub fn max_code_len(&self) -> usize {
        self.entries.values().map(|e| e.code.len()).max().unwrap_or(0)
    }
}

/// Renders a code as a string of '0' and '1'.
pub fn format_code(code: &BitSlice<u8, Msb0>) -> String {
    code.iter()
        .by_vals()
        .map(|b| if b { '1' } else { '0' })
        .collect()
}

/// Printable ASCII as `'c'`, other bytes as three octal digits, the sentinel as `EOF`.
pub fn format_symbol(symbol: Symbol) -> String {
    match symbol {
        SENTINEL => "EOF".to_string(),
        0x20..=0x7e => format!("'{}'", symbol as u8 as char),
        _ => format!("{:03o}", symbol),
    }
}
