//! Protobuf IDL text parser

use super::builder::ModelBuilder;
use super::{lexer, walker};
use crate::SchemaParser;
use protoscaffold_common::{GeneratorError, Result, ServiceDefinition};
use std::fs;
use std::path::Path;

/// Extracts services from `.proto` source text
///
/// The source is read into memory once; every `parse` call re-walks that text.
pub struct ProtoParser {
    /// File path or caller-supplied name, used in diagnostics
    source_name: String,

    source: String,
}

impl ProtoParser {
    /// Read a `.proto` file
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = ProtoParser::from_file("api/user/v1/user.proto")?;
    /// let service = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| GeneratorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|e| {
            let valid = String::from_utf8_lossy(&e.as_bytes()[..e.utf8_error().valid_up_to()]);
            GeneratorError::Syntax {
                location: lexer::end_location(&valid),
                message: "source is not valid UTF-8".to_string(),
            }
        })?;

        Ok(Self::from_source(path.display().to_string(), source))
    }

    /// Wrap in-memory source text
    pub fn from_source(source_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            source: source.into(),
        }
    }
}

impl SchemaParser for ProtoParser {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn parse_all(&self) -> Result<Vec<ServiceDefinition>> {
        let tokens = lexer::tokenize(&self.source)?;
        let mut builder = ModelBuilder::new();
        walker::walk(&tokens, lexer::end_location(&self.source), &mut builder)?;
        builder.finish(&self.source_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoscaffold_common::Location;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_service() {
        let parser = ProtoParser::from_source(
            "inline.proto",
            "service Ping { rpc Check (CheckRequest) returns (CheckReply); }",
        );
        let service = parser.parse().unwrap();
        assert_eq!(service.name, "Ping");
        assert_eq!(service.methods[0].request_type_short, "Check");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = ProtoParser::from_file("/nonexistent/dir/user.proto");
        assert!(matches!(result, Err(GeneratorError::Read { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_syntax_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"syntax = \"proto3\";\n// caf\xff\n").unwrap();

        match ProtoParser::from_file(file.path()) {
            Err(GeneratorError::Syntax { location, message }) => {
                assert_eq!(location, Location { line: 2, column: 7 });
                assert_eq!(message, "source is not valid UTF-8");
            }
            other => panic!("expected syntax error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_no_service_names_source() {
        let parser = ProtoParser::from_source("types.proto", "message A { int32 id = 1; }");
        let err = parser.parse().unwrap_err();
        assert_eq!(err.to_string(), "No service declaration found in types.proto");
    }
}
