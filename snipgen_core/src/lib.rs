//! `snipgen_core` is the engine behind the [snipgen](https://github.com/snipgen/snipgen)
//! code generator. It locates marker-delimited snippet regions inside
//! existing source files, replaces their contents with programmatically
//! produced text, and supports generating whole new files from scratch.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source file
//!   → Tag scanner (streams lines, detects start/end marker pairs)
//!   → Snippet registry (resolves the region name to a callback)
//!   → Section (callback emits deferred, indentation-aware text)
//!   → Emitter (linearizes the section, re-indented under the region prefix)
//!   → Temp file → atomic rename over the original
//! ```
//!
//! ## Key Types
//!
//! - [`Section`] — The deferred text-layout buffer: out-of-order
//!   composition through nested placeholders, indent/dedent levels, and
//!   blank-line padding.
//! - [`Emitter`] — Renders a `Section` tree into a byte stream.
//! - [`Scope`] — A parent-linked key/value environment visible to snippet
//!   callbacks; derived per directory and per file.
//! - [`SnippetRegistry`] — An explicit, layerable name → callback table.
//! - [`TagPair`] — The configurable start/end marker tokens.
//! - [`SnipgenConfig`] — Project configuration and per-directory manifests
//!   loaded from `snipgen.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snipgen_core::{RunOptions, Scope, SnippetRegistry, run_project};
//! use std::path::Path;
//!
//! let mut registry = SnippetRegistry::new();
//! registry.register("hello", |section, root, _scope, _arg| {
//! 	section.emitln(root, "hello, world");
//! 	Ok(())
//! });
//!
//! run_project(
//! 	Path::new("."),
//! 	&registry,
//! 	Scope::new(),
//! 	RunOptions::default(),
//! )
//! .unwrap();
//! ```

pub use config::*;
pub use emitter::*;
pub use error::*;
pub use parser::*;
pub use project::*;
pub use registry::*;
pub use scope::*;
pub use section::*;
pub use write_file::*;

pub mod config;
mod emitter;
mod error;
mod parser;
pub mod project;
mod registry;
mod scope;
mod section;
mod write_file;
