pub mod bitstream;
pub mod builder;
pub mod code;
pub mod config;
pub mod error;
pub mod frequency;
pub mod node;
pub mod pack;
pub mod queue;
pub mod tree;

// Re-export main types
pub use builder::{Phase, TreeBuilder};
pub use code::{code_for, Code, CodeEntry, CodeTable};
pub use config::Cfg;
pub use error::{Error, Result};
pub use frequency::{FrequencyTable, Symbol, SENTINEL};
pub use node::{NodeArena, NodeId, Side};
pub use pack::{unpack, PackStats, Packer};
pub use queue::PriorityQueue;
pub use tree::HuffmanTree;
