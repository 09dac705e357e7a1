//! Built-in blocks

use crate::registry::{BlockFactory, BlockMetadata, BlockRegistry};
use async_trait::async_trait;
use blockcore::{Block, BlockError, BlockIOBase, BlockRunner};
use std::sync::Arc;

pub const ECHO_BLOCK_TYPE: &str = "debug.echo";

/// Returns its input unchanged
pub struct EchoBlock;

#[async_trait]
impl BlockRunner for EchoBlock {
    fn block_type(&self) -> &str {
        ECHO_BLOCK_TYPE
    }

    async fn run(&self, block: &Block) -> Result<BlockIOBase, BlockError> {
        for (key, value) in block.input.iter() {
            tracing::debug!("  {}: {}", key, value);
        }

        Ok(block.input.clone())
    }
}

pub struct EchoBlockFactory;

impl BlockFactory for EchoBlockFactory {
    fn create(&self) -> Box<dyn BlockRunner> {
        Box::new(EchoBlock)
    }

    fn block_type(&self) -> &str {
        ECHO_BLOCK_TYPE
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Returns its input unchanged".to_string(),
            category: "debug".to_string(),
        }
    }
}

/// Register all built-in blocks with a registry
pub fn register_all(registry: &mut BlockRegistry) {
    registry.register(Arc::new(EchoBlockFactory));
}
