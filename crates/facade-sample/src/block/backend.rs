use crate::model::{Block, BlockType};
use async_trait::async_trait;
use facade_framework::FacadeError;

/// Storage for the model's change blocks. At most one block per [`BlockType`].
#[async_trait]
pub trait BlockBackend: Send + Sync {
    /// Active blocks, ordered by type.
    async fn blocks(&self) -> Result<Vec<Block>, FacadeError>;

    /// Enables `block_type`, replacing the message if it was already on.
    async fn switch_on(&self, block_type: BlockType, message: &str) -> Result<(), FacadeError>;

    /// Disables `block_type`. Returns whether it was on.
    async fn switch_off(&self, block_type: BlockType) -> Result<bool, FacadeError>;
}
