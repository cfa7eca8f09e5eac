//! Protobuf IDL text strategy
//!
//! Text is tokenized with `nom`, walked once by a recursive-descent pass, and
//! the walk's declaration callbacks are folded into the model.
//!
//! ## Example
//! ```rust,ignore
//! use protoscaffold_parser::{ProtoParser, SchemaParser};
//!
//! let parser = ProtoParser::from_file("api/user/v1/user.proto")?;
//! for service in parser.parse_all()? {
//!     println!("{}: {} rpcs", service.name, service.methods.len());
//! }
//! ```

mod builder;
mod lexer;
mod parser;
mod walker;

pub use parser::ProtoParser;
