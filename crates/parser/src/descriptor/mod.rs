//! Compiled descriptor strategy
//!
//! Reads a serialized `FileDescriptorSet` (or a single `FileDescriptorProto`)
//! and extracts services through `prost-reflect`.
//!
//! ## Sources
//! - **protoc**: `protoc --include_imports --descriptor_set_out=api.pb api.proto`
//! - **buf**: `buf build -o api.binpb`
//!
//! ## Example
//! ```rust,ignore
//! use protoscaffold_parser::{DescriptorParser, SchemaParser};
//!
//! let parser = DescriptorParser::from_file("api.pb")?;
//! let service = parser.parse()?;
//! ```

mod converter;
mod parser;

pub use converter::wire_type_keyword;
pub use parser::DescriptorParser;
