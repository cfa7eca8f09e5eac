//! Common types and utilities for protoscaffold
//!
//! This crate contains the intermediate representation extracted from a
//! protobuf schema, the shared error type, and the naming helpers used by
//! the parser, generator, and CLI components.

pub mod naming;
mod render_options;

pub use render_options::RenderOptions;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting a model or generating code
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The schema source could not be opened or read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The IDL text is not syntactically valid
    #[error("Syntax error at {location}: {message}")]
    Syntax { location: Location, message: String },

    /// The binary descriptor could not be decoded or resolved
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// The walk completed without encountering a service declaration
    #[error("No service declaration found in {0}")]
    NoService(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for protoscaffold operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// 1-based position in a schema source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One service extracted from a schema unit, with the file-level facts
/// (package, go_package, messages, imports) it was declared alongside
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Service name, UpperCamelCase (e.g., "UserService")
    pub name: String,
    /// Dotted proto package (e.g., "user.v1")
    pub proto_package: String,
    /// Slash-delimited module path from `go_package`, alias removed
    pub go_package: String,
    pub methods: Vec<MethodDefinition>,
    pub messages: Vec<MessageDefinition>,
    pub import_paths: Vec<String>,
}

/// One RPC of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    /// Method name, UpperCamelCase
    pub name: String,
    /// Request type as written, without a leading dot (e.g., "user.v1.CreateUserRequest")
    pub request_type_full: String,
    /// Response type as written, without a leading dot
    pub response_type_full: String,
    /// Bare request type with a trailing "Request" removed (e.g., "CreateUser")
    pub request_type_short: String,
    /// Bare response type with a trailing "Reply" removed
    pub response_type_short: String,
    pub streaming_mode: StreamingMode,
    /// Mirrors `streaming_mode` for template consumers
    pub client_streaming: bool,
    /// Mirrors `streaming_mode` for template consumers
    pub server_streaming: bool,
}

/// Streaming classification of an RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StreamingMode {
    #[default]
    Unary,
    ClientStreaming,
    ServerStreaming,
    Bidirectional,
}

impl StreamingMode {
    /// Classify from the `stream` flags on the request and response side
    pub fn from_flags(request_streams: bool, response_streams: bool) -> Self {
        match (request_streams, response_streams) {
            (false, false) => StreamingMode::Unary,
            (true, false) => StreamingMode::ClientStreaming,
            (false, true) => StreamingMode::ServerStreaming,
            (true, true) => StreamingMode::Bidirectional,
        }
    }

    pub fn is_client_streaming(self) -> bool {
        matches!(
            self,
            StreamingMode::ClientStreaming | StreamingMode::Bidirectional
        )
    }

    pub fn is_server_streaming(self) -> bool {
        matches!(
            self,
            StreamingMode::ServerStreaming | StreamingMode::Bidirectional
        )
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StreamingMode::Unary => "unary",
            StreamingMode::ClientStreaming => "client-streaming",
            StreamingMode::ServerStreaming => "server-streaming",
            StreamingMode::Bidirectional => "bidirectional",
        };
        f.write_str(label)
    }
}

/// A message declaration and the normal fields declared directly inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDefinition {
    /// Message name, UpperCamelCase
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl MessageDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }
}

/// A normal (non-map, non-oneof) message field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name as declared
    pub name: String,
    /// Scalar keyword, bare message/enum name, `[]`-prefixed when repeated
    #[serde(rename = "type")]
    pub field_type: String,
    /// Wire field tag
    pub number: u32,
    /// True for the fixed scalar set and its repeated forms
    pub is_basic_type: bool,
}

/// Scalar keywords treated as basic types, with their repeated forms
const BASIC_TYPES: &[&str] = &[
    "bool", "int32", "int64", "uint32", "uint64", "float32", "float64", "string", "bytes",
];

impl FieldDefinition {
    /// Build a field, deriving `is_basic_type` from the normalized type token
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, number: u32) -> Self {
        let field_type = field_type.into();
        let is_basic_type = is_basic_type(&field_type);
        Self {
            name: name.into(),
            field_type,
            number,
            is_basic_type,
        }
    }
}

/// Check a normalized type token against the basic scalar set
pub fn is_basic_type(field_type: &str) -> bool {
    let scalar = field_type.strip_prefix("[]").unwrap_or(field_type);
    BASIC_TYPES.contains(&scalar)
}
