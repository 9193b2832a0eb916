use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::SchemaError;
use crate::schema::MetadataSchema;

/// Source of metadata schemas, looked up by name.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
  async fn load(&self, name: &str) -> Result<MetadataSchema, SchemaError>;
}

/// Loads schemas from `{root}/{name}.json`.
pub struct FsSchemaLoader {
  root: PathBuf,
}

impl FsSchemaLoader {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn schema_path(&self, name: &str) -> Result<PathBuf, SchemaError> {
    let valid = !name.is_empty()
      && name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
      && !name.contains("..");

    if !valid {
      return Err(SchemaError::InvalidName(name.to_string()));
    }

    Ok(self.root.join(format!("{}.json", name)))
  }
}

#[async_trait]
impl SchemaLoader for FsSchemaLoader {
  async fn load(&self, name: &str) -> Result<MetadataSchema, SchemaError> {
    let path = self.schema_path(name)?;

    let content = match fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(SchemaError::NotFound(name.to_string()));
      }
      Err(e) => return Err(e.into()),
    };

    let json_schema: serde_json::Value = serde_json::from_str(&content)?;
    MetadataSchema::from_json(&json_schema)
  }
}

/// Schemas held in memory.
#[derive(Debug, Default)]
pub struct InMemorySchemaLoader {
  schemas: HashMap<String, serde_json::Value>,
}

impl InMemorySchemaLoader {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, json_schema: serde_json::Value) {
    self.schemas.insert(name.into(), json_schema);
  }
}

#[async_trait]
impl SchemaLoader for InMemorySchemaLoader {
  async fn load(&self, name: &str) -> Result<MetadataSchema, SchemaError> {
    let json_schema = self
      .schemas
      .get(name)
      .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;
    MetadataSchema::from_json(json_schema)
  }
}
