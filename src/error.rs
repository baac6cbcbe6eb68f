use crate::builder::Phase;
use crate::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extract from empty priority queue")]
    EmptyQueue,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Priority queue full (capacity {0})")]
    CapacityExceeded(usize),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(u16),

    #[error("Builder is in phase {found:?}, expected {expected:?}")]
    InvalidPhase { expected: Phase, found: Phase },

    #[error("Weight overflow while merging nodes")]
    WeightOverflow,

    #[error("Node {0:?} is not linked from its parent")]
    BrokenLink(NodeId),

    #[error("Corrupt tree: {0}")]
    CorruptTree(String),

    #[error("Invalid packed format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
