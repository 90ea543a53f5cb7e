use super::backend::BlockBackend;
use crate::model::{Block, BlockType};
use facade_framework::{describe_facade, Authorizer, FacadeError, Permission};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// `Block` version 2: lists and toggles the model's change blocks.
pub struct BlockApi {
    backend: Arc<dyn BlockBackend>,
    authorizer: Arc<dyn Authorizer>,
}

describe_facade!(BlockApi => [list, switch_block_on, switch_block_off]);

impl BlockApi {
    pub fn new(backend: Arc<dyn BlockBackend>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            backend,
            authorizer,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Block>, FacadeError> {
        self.check_read()?;
        self.backend.blocks().await
    }

    #[instrument(skip(self))]
    pub async fn switch_block_on(
        &self,
        block_type: BlockType,
        message: &str,
    ) -> Result<(), FacadeError> {
        self.check_write()?;
        self.backend.switch_on(block_type, message).await?;
        info!(?block_type, by = self.authorizer.auth_tag(), "Block switched on");
        Ok(())
    }

    /// Switching off a block that is not on is not an error.
    #[instrument(skip(self))]
    pub async fn switch_block_off(&self, block_type: BlockType) -> Result<(), FacadeError> {
        self.check_write()?;
        if self.backend.switch_off(block_type).await? {
            info!(?block_type, by = self.authorizer.auth_tag(), "Block switched off");
        } else {
            debug!(?block_type, "Block was not on");
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), FacadeError> {
        if self.authorizer.has_permission(Permission::Read) || self.can_write() {
            Ok(())
        } else {
            Err(FacadeError::PermissionDenied)
        }
    }

    fn check_write(&self) -> Result<(), FacadeError> {
        if self.can_write() {
            Ok(())
        } else {
            Err(FacadeError::PermissionDenied)
        }
    }

    fn can_write(&self) -> bool {
        self.authorizer.has_permission(Permission::Write)
            || self.authorizer.has_permission(Permission::Admin)
    }
}
