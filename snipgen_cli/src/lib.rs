use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Inspect and validate generated snippet regions in your source files.",
	long_about = "snipgen maintains machine-generated regions inside hand-written files. Each \
	              region is delimited by a start marker naming a snippet (optionally with a JSON \
	              argument) and a matching end marker; everything between the markers is replaced \
	              by the snippet's output on every run, while the surrounding file is left \
	              byte-for-byte untouched.\n\nGeneration itself happens through the snipgen_core \
	              library, where snippet callbacks are registered in Rust. This binary covers the \
	              read-only side:\n  snipgen check  Validate every region in the project\n  \
	              snipgen list   List every region with its snippet name and argument"
)]
pub struct SnipgenCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to start the project root search from.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,

	/// Start marker token, overriding the project config.
	#[arg(long, global = true)]
	pub tag_start: Option<String>,

	/// End marker token, overriding the project config.
	#[arg(long, global = true)]
	pub tag_end: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Check that every snippet region in the project is well formed.
	///
	/// Walks every file under the project root (honouring `.gitignore`) and
	/// validates each region: the start marker must name a snippet, its
	/// argument must decode as JSON, and a matching end marker must follow
	/// before the next start marker or end of file. Exits with a non-zero
	/// status code if any region is malformed.
	///
	/// Ideal for CI pipelines to catch markers broken by hand edits.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List every snippet region found in the project.
	///
	/// Displays each region's snippet name, JSON argument, file and line
	/// span. Useful for auditing which snippets a project depends on before
	/// renaming or removing one.
	List {
		/// Output format for list results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each region includes the
	/// file path, snippet name, decoded argument, and line span.
	Json,
}
