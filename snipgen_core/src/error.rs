use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SnipgenError {
	#[error(transparent)]
	#[diagnostic(code(snipgen::io_error))]
	Io(#[from] std::io::Error),

	#[error("dedent below the section's starting indentation level")]
	#[diagnostic(
		code(snipgen::indent_underflow),
		help("every dedent() must be preceded by a matching indent() on the same section")
	)]
	IndentUnderflow,

	#[error("{file}, snippet `{snippet}`, line {line_err}: unclosed snippet, reached end of file without finding snippet end")]
	#[diagnostic(
		code(snipgen::unclosed_snippet),
		help("add an end-tag line with the same leading prefix as the start-tag line")
	)]
	UnclosedSnippet {
		file: String,
		snippet: String,
		line_start: usize,
		line_err: usize,
	},

	#[error("{file}, snippet `{snippet}` (started line {line_start}), line {line_err}: found start of new snippet before the current one was closed")]
	#[diagnostic(
		code(snipgen::nested_snippet),
		help("snippets cannot be nested; close the open snippet first")
	)]
	NestedSnippet {
		file: String,
		snippet: String,
		line_start: usize,
		line_err: usize,
	},

	#[error("{file}, snippet `{snippet}`, line {line}: failed to decode snippet argument `{raw}`: {reason}")]
	#[diagnostic(
		code(snipgen::snippet_argument),
		help("the text after the snippet name must be empty, `null`, or valid JSON")
	)]
	SnippetArgument {
		file: String,
		snippet: String,
		line: usize,
		raw: String,
		reason: String,
	},

	#[error("error executing snippet `{snippet}` called from {file}, region starting line {line_start}: {reason}")]
	#[diagnostic(code(snipgen::snippet_failed))]
	SnippetFailed {
		snippet: String,
		file: String,
		line_start: usize,
		reason: String,
	},

	#[error("undefined snippet `{snippet}` called from {file}")]
	#[diagnostic(
		code(snipgen::undefined_snippet),
		help("register the snippet on the `SnippetRegistry` passed to the engine")
	)]
	UndefinedSnippet { snippet: String, file: String },

	#[error("error executing generator for `{file}`: {reason}")]
	#[diagnostic(code(snipgen::generator_failed))]
	GeneratorFailed { file: String, reason: String },

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(
		code(snipgen::config_parse),
		help("check that snipgen.toml is valid TOML with [parse], [indent] and/or [scope] sections")
	)]
	ConfigParse { path: String, reason: String },

	#[error("failed to find project root relative to {start}")]
	#[diagnostic(
		code(snipgen::project_root_not_found),
		help("create a `snipgen.toml` in the root of your project, or pass the root explicitly")
	)]
	ProjectRootNotFound { start: String },

	#[error("invalid entry `{entry}` in {manifest}: `files` entries must be plain filenames, not paths")]
	#[diagnostic(code(snipgen::invalid_file_entry))]
	InvalidFileEntry { entry: String, manifest: String },

	#[error("file `{file}` listed in {manifest} does not exist or is not a regular file")]
	#[diagnostic(code(snipgen::missing_parse_file))]
	MissingParseFile { file: String, manifest: String },
}

pub type SnipgenResult<T> = Result<T, SnipgenError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
