//! PromQL Language Tools
//!
//! This crate provides editor support for PromQL: it works out what kind of
//! token belongs at a cursor position in a possibly half-typed query and
//! produces completion suggestions for it.
//!
//! ## Features
//!
//! - **Tolerant parsing**: Incomplete queries still produce a tree
//! - **Cursor positions**: Classify the cursor into one detailed position
//! - **Completions**: Get intellisense suggestions at cursor position
//! - **Syntax Validation**: Check PromQL queries for syntax errors
//! - **Classification**: Get syntax highlighting spans
//!
//! ## Usage
//!
//! ```no_run
//! use promql_language_tools::PromqlLanguageService;
//!
//! fn main() -> Result<(), promql_language_tools::Error> {
//!     let service = PromqlLanguageService::new()?;
//!     let query = "sum(rate(http_requests_total[5m])) by (";
//!
//!     for item in service.get_completions(query, query.len(), None).items {
//!         println!("{} ({:?})", item.label, item.kind);
//!     }
//!
//!     let result = service.validate_syntax(query);
//!     for diagnostic in result.diagnostics() {
//!         println!("Error at {}:{}: {}", diagnostic.line, diagnostic.column, diagnostic.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Definitions
//!
//! Functions, operators and label matchers come from a [`Registry`]. The
//! built-in tables cover standard PromQL; a JSON file named by the
//! `PROMQL_LANGUAGE_TOOLS_DEFINITIONS` environment variable replaces them.

pub mod ast;
mod builtins;
mod classification;
mod classifier;
mod completion;
pub mod cursor;
mod definitions;
mod error;
pub mod lexer;
mod parser;
mod position;
mod registry;
mod schema;
mod service;
mod suggestions;
mod types;
pub mod walker;

pub use classification::{classify, ClassificationKind, ClassificationResult, ClassifiedSpan};
pub use classifier::get_query_position;
pub use completion::{CompletionItem, CompletionKind, CompletionResult};
pub use definitions::{
    DefinitionTables, FunctionDefinition, FunctionKind, LabelMatcherDefinition,
    OperatorDefinition, Param, ParamType, Signature,
};
pub use error::Error;
pub use parser::{parse, ParseResult};
pub use position::{DetailedPosition, PositionKind};
pub use registry::{Registry, DEFINITIONS_PATH_ENV};
pub use schema::{Column, Schema};
pub use service::PromqlLanguageService;
pub use suggestions::{position_handler, suggest, Handler, SuggestionContext};
pub use types::{Diagnostic, DiagnosticSeverity, ValidationResult};

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
