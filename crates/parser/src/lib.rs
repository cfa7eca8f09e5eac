//! Schema parsing for protobuf service definitions
//!
//! This crate turns one protobuf schema unit into the intermediate
//! representation (`ServiceDefinition`) consumed by the layer generator.
//!
//! ## Parsing Strategies
//!
//! - **IDL text** ([`ProtoParser`]): `.proto` source is tokenized and walked
//!   once, top to bottom, folding declarations into the model.
//! - **Compiled descriptors** ([`DescriptorParser`]): a serialized
//!   `FileDescriptorSet` is loaded into a reflection pool and its last file
//!   is converted.
//!
//! Both implement [`SchemaParser`] and produce the same messages, fields,
//! method names and short type names for the same schema. The full request
//! and response type names differ: text keeps each reference as written,
//! descriptors give the resolved fully qualified name. Declarations the model does not describe (enums, oneofs, map
//! fields, groups, extensions, reserved ranges) are skipped, never rejected.

mod descriptor;
mod model;
mod proto;

pub use descriptor::{wire_type_keyword, DescriptorParser};
pub use proto::ProtoParser;

use protoscaffold_common::{GeneratorError, Result, ServiceDefinition};
use std::fs;
use std::path::Path;

/// Common interface over the extraction strategies
pub trait SchemaParser {
    /// Name of the schema unit, used in diagnostics
    fn source_name(&self) -> &str;

    /// Every service declared in the unit, in declaration order
    fn parse_all(&self) -> Result<Vec<ServiceDefinition>>;

    /// The first service declared in the unit
    fn parse(&self) -> Result<ServiceDefinition> {
        self.parse_all()?
            .into_iter()
            .next()
            .ok_or_else(|| GeneratorError::NoService(self.source_name().to_string()))
    }
}

/// Input format of a schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Protobuf IDL text
    Proto,
    /// Serialized `FileDescriptorSet`
    Descriptor,
}

const DESCRIPTOR_EXTENSIONS: &[&str] = &["pb", "desc", "binpb", "protoset"];

impl SchemaFormat {
    /// Infer the format from the extension, then from the content
    pub fn detect(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("proto") => return Ok(SchemaFormat::Proto),
            Some(ext) if DESCRIPTOR_EXTENSIONS.contains(&ext) => {
                return Ok(SchemaFormat::Descriptor)
            }
            _ => {}
        }

        let bytes = fs::read(path).map_err(|source| GeneratorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::sniff(&bytes))
    }

    fn sniff(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text)
                if ["syntax", "service", "message"]
                    .iter()
                    .any(|kw| text.contains(kw)) =>
            {
                SchemaFormat::Proto
            }
            _ => SchemaFormat::Descriptor,
        }
    }
}

/// Open a schema file with the strategy for `format`, detecting it when absent
pub fn open_schema(path: &Path, format: Option<SchemaFormat>) -> Result<Box<dyn SchemaParser>> {
    let format = match format {
        Some(format) => format,
        None => SchemaFormat::detect(path)?,
    };
    tracing::debug!(path = %path.display(), ?format, "opening schema");

    Ok(match format {
        SchemaFormat::Proto => Box::new(ProtoParser::from_file(path)?),
        SchemaFormat::Descriptor => Box::new(DescriptorParser::from_file(path)?),
    })
}

/// Parse every service in a schema file
///
/// # Arguments
/// * `path` - `.proto` source or compiled descriptor set
/// * `format` - Input format; detected from the file when `None`
pub fn parse_schema_file(
    path: &Path,
    format: Option<SchemaFormat>,
) -> Result<Vec<ServiceDefinition>> {
    open_schema(path, format)?.parse_all()
}
