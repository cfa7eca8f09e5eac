//! FileDescriptorSet parser

use crate::SchemaParser;
use protoscaffold_common::{GeneratorError, Result, ServiceDefinition};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::fs;
use std::path::Path;

/// Extracts services from compiled protobuf descriptors
pub struct DescriptorParser {
    /// Descriptor pool for reflection
    pool: DescriptorPool,

    /// Name of the file whose services are extracted; the last file in the set
    primary_file: Option<String>,

    /// File path or caller-supplied name, used in diagnostics
    source_name: String,
}

impl DescriptorParser {
    /// Load a FileDescriptorSet from a binary file
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = DescriptorParser::from_file("api.pb")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| GeneratorError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut parser = Self::from_file_descriptor_set(&bytes)?;
        parser.source_name = path.display().to_string();
        Ok(parser)
    }

    /// Parse a FileDescriptorSet from bytes
    ///
    /// Dependencies must precede the files that import them, as `protoc
    /// --include_imports` emits them.
    pub fn from_file_descriptor_set(bytes: &[u8]) -> Result<Self> {
        let file_descriptor_set = FileDescriptorSet::decode(bytes).map_err(|e| {
            GeneratorError::Descriptor(format!("Failed to decode FileDescriptorSet: {}", e))
        })?;

        Self::from_set(file_descriptor_set)
    }

    /// Parse a single FileDescriptorProto from bytes
    ///
    /// Only self-contained files resolve; imported types need the full set.
    pub fn from_file_descriptor_proto(bytes: &[u8]) -> Result<Self> {
        let file = FileDescriptorProto::decode(bytes).map_err(|e| {
            GeneratorError::Descriptor(format!("Failed to decode FileDescriptorProto: {}", e))
        })?;

        Self::from_set(FileDescriptorSet { file: vec![file] })
    }

    fn from_set(file_descriptor_set: FileDescriptorSet) -> Result<Self> {
        let primary_file = file_descriptor_set
            .file
            .last()
            .map(|f| f.name().to_string());
        let source_name = primary_file
            .clone()
            .unwrap_or_else(|| "<empty descriptor set>".to_string());

        let pool = DescriptorPool::from_file_descriptor_set(file_descriptor_set).map_err(|e| {
            GeneratorError::Descriptor(format!("Failed to create DescriptorPool: {}", e))
        })?;

        Ok(Self {
            pool,
            primary_file,
            source_name,
        })
    }

    /// Get reference to the underlying descriptor pool
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

impl SchemaParser for DescriptorParser {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn parse_all(&self) -> Result<Vec<ServiceDefinition>> {
        let Some(file_name) = &self.primary_file else {
            return Err(GeneratorError::NoService(self.source_name.clone()));
        };
        super::converter::convert_file(&self.pool, file_name, &self.source_name)
    }
}
