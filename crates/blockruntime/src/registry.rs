use blockcore::{Block, BlockError, BlockIOBase, BlockRunner};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating block runners
pub trait BlockFactory: Send + Sync {
    /// Create a runner for this block type
    fn create(&self) -> Box<dyn BlockRunner>;

    /// Get block type identifier
    fn block_type(&self) -> &str;

    /// Optional: describe the block for listings
    fn metadata(&self) -> BlockMetadata {
        BlockMetadata::default()
    }
}

/// Metadata about a block type
#[derive(Debug, Clone)]
pub struct BlockMetadata {
    pub description: String,
    pub category: String,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
        }
    }
}

/// Registry of available block types, keyed by the `type` discriminator
pub struct BlockRegistry {
    factories: HashMap<String, Arc<dyn BlockFactory>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in blocks
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::blocks::register_all(&mut registry);
        registry
    }

    /// Register a block factory. A later registration replaces an earlier
    /// one for the same type.
    pub fn register(&mut self, factory: Arc<dyn BlockFactory>) {
        let block_type = factory.block_type().to_string();
        tracing::info!("Registering block type: {}", block_type);
        if self.factories.insert(block_type.clone(), factory).is_some() {
            tracing::warn!("Block type {} was already registered, replacing", block_type);
        }
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.factories.contains_key(block_type)
    }

    /// Create a runner for a block type
    pub fn create_runner(&self, block_type: &str) -> Result<Box<dyn BlockRunner>, BlockError> {
        let factory = self
            .factories
            .get(block_type)
            .ok_or_else(|| BlockError::NotImplemented {
                block_type: block_type.to_string(),
            })?;

        Ok(factory.create())
    }

    /// Dispatch a block to the runner registered for its type
    pub async fn run(&self, block: &Block) -> Result<BlockIOBase, BlockError> {
        let runner = self.create_runner(&block.block_type).map_err(|e| {
            tracing::error!("No runner for block {} ({}): {}", block.id, block.block_type, e);
            e
        })?;

        tracing::debug!("Running block {} ({})", block.id, block.block_type);
        runner.run(block).await
    }

    /// Get all registered block types, sorted
    pub fn list_block_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Get metadata for a block type
    pub fn get_metadata(&self, block_type: &str) -> Option<BlockMetadata> {
        self.factories.get(block_type).map(|f| f.metadata())
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
