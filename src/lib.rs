//! @ai:module:intent Compile annotated doc comments into versioned API documentation
//! @ai:module:layer infrastructure
//! @ai:module:public_api compiler, changelog, source, config, annotation, output, error
//! @ai:module:stateless true
//!
//! # API doc compiler
//!
//! Reads `@api-*` tags from the doc comments of controller classes and
//! representation classes, validates them into typed annotations, and
//! compiles one snapshot of the API per configured version together with a
//! changelog between consecutive versions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use apidoc_compiler::{output, Changelog, Compiler, Config, FileDocSource};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("apidoc.toml")).unwrap();
//! let source = FileDocSource::open(Path::new("src")).unwrap();
//!
//! let compiled = Compiler::new(&config, &source).compile().unwrap();
//! println!("{}", output::format_compiled(&compiled, output::OutputFormat::Text));
//!
//! let changelog = Changelog::build(&compiled, &config);
//! println!("{}", output::format_changelog(&changelog, output::OutputFormat::JsonPretty));
//! ```

pub mod action;
pub mod annotation;
pub mod changelog;
pub mod compiler;
pub mod config;
pub mod docblock;
pub mod error;
pub mod filter;
pub mod language;
pub mod mson;
pub mod output;
pub mod parser;
pub mod representation;
pub mod source;
pub mod version;

pub use action::ResourceAction;
pub use annotation::{build_block, Annotation, BuiltBlock, Faceted, Payload};
pub use changelog::{ChangeKind, ChangeRecord, ChangeSet, ChangeType, Changelog, VersionChangelog};
pub use compiler::{CompileOptions, Compiled, Compiler, Snapshot};
pub use config::Config;
pub use docblock::Docblock;
pub use error::{AnnotationError, Error, Origin, Result, VersionError, Warning};
pub use filter::FilterPolicy;
pub use language::{detect_language, is_supported_file, Language};
pub use output::{format_blocks, format_changelog, format_compiled, to_json, OutputFormat};
pub use representation::Representation;
pub use source::{DocSource, FileDocSource, MemoryDocSource};
pub use version::{Version, VersionNumber};
