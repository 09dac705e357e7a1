use crate::BlockError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Base input/output payload shared by all blocks.
///
/// The base declares no fields of its own. Every key is kept in `extra`, so
/// concrete block types can attach fields the UI and the engine don't know
/// about each other without breaking either side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockIOBase {
    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BlockIOBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.extra.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extra.iter()
    }

    /// View the bag as a concrete block's typed IO struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, BlockError> {
        let object = Value::Object(self.extra.into_iter().collect());
        serde_json::from_value(object).map_err(|e| BlockError::InvalidInput {
            field: "input".to_string(),
            message: e.to_string(),
        })
    }

    /// Encode a typed IO struct back into the open bag.
    pub fn from_typed<T: Serialize>(typed: &T) -> Result<Self, BlockError> {
        match serde_json::to_value(typed) {
            Ok(Value::Object(map)) => Ok(Self {
                extra: map.into_iter().collect(),
            }),
            Ok(other) => Err(BlockError::InvalidInput {
                field: "input".to_string(),
                message: format!("expected an object, got {}", json_kind(&other)),
            }),
            Err(e) => Err(BlockError::InvalidInput {
                field: "input".to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl FromIterator<(String, Value)> for BlockIOBase {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            extra: iter.into_iter().collect(),
        }
    }
}

/// A unit of work placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub input: BlockIOBase,
}

impl Block {
    pub fn new(id: impl Into<String>, block_type: impl Into<String>, input: BlockIOBase) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            input,
        }
    }
}

/// Execution capability of a block type.
///
/// One implementation exists per `type` discriminator; the runtime's
/// registry picks it. The default `run` is the abstract base and always
/// fails.
#[async_trait]
pub trait BlockRunner: Send + Sync {
    /// Type discriminator this runner handles (e.g. "debug.echo")
    fn block_type(&self) -> &str;

    async fn run(&self, block: &Block) -> Result<BlockIOBase, BlockError> {
        Err(BlockError::NotImplemented {
            block_type: block.block_type.clone(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
