use serde::{Deserialize, Serialize};

/// Kinds of change a block guards against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    /// Blocks destroying the model.
    Destroy,
    /// Blocks removing machines, applications and units.
    Remove,
    /// Blocks every change.
    Change,
}

/// An active block and the message shown to whoever trips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    pub message: String,
}
