use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::SnipgenError;
use crate::SnipgenResult;
use crate::TagPair;
use crate::parser::DEFAULT_TAG_END;
use crate::parser::DEFAULT_TAG_START;

/// Name of the configuration/manifest file, both at the project root and in
/// subdirectories.
pub const CONFIG_FILE: &str = "snipgen.toml";

/// Indent unit used when neither the project config nor any directory
/// manifest configures one for a file's extension.
pub const DEFAULT_INDENT: &str = "   ";

/// Configuration loaded from a `snipgen.toml` file.
///
/// At the project root the `[parse]` section configures the marker tokens.
/// In any directory (the root included) the same file doubles as a manifest:
/// `files` lists the filenames in that directory to rewrite, `exclude` names
/// child directories to skip, `[scope]` adds bindings to that directory's
/// scope, and `[indent]` overrides indent units by file extension for the
/// subtree.
///
/// ```toml
/// [parse]
/// tag_start = "<<?"
/// tag_end = "?>>"
///
/// files = ["main.c", "config.h"]
/// exclude = ["vendor"]
///
/// [scope]
/// project = "frobnicator"
/// ports = [8080, 8081]
///
/// [indent]
/// default = "    "
///
/// [indent.extensions]
/// go = "\t"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnipgenConfig {
	#[serde(default)]
	pub parse: ParseConfig,
	#[serde(default)]
	pub indent: IndentConfig,
	/// Plain filenames in this directory whose snippet regions should be
	/// rewritten.
	#[serde(default)]
	pub files: Vec<String>,
	/// Names of child directories excluded from the walk.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// Bindings merged into this directory's scope.
	#[serde(default)]
	pub scope: BTreeMap<String, Value>,
}

/// The `[parse]` section: marker token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
	#[serde(default = "default_tag_start")]
	pub tag_start: String,
	#[serde(default = "default_tag_end")]
	pub tag_end: String,
}

impl Default for ParseConfig {
	fn default() -> Self {
		Self {
			tag_start: default_tag_start(),
			tag_end: default_tag_end(),
		}
	}
}

impl ParseConfig {
	pub fn tag_pair(&self) -> TagPair {
		TagPair::new(self.tag_start.clone(), self.tag_end.clone())
	}
}

/// The `[indent]` section: indent unit per file extension, with a fallback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndentConfig {
	/// Fallback indent unit for extensions without an explicit entry.
	#[serde(default)]
	pub default: Option<String>,
	/// Indent unit keyed by file extension (without the leading dot).
	#[serde(default)]
	pub extensions: BTreeMap<String, String>,
}

fn default_tag_start() -> String {
	DEFAULT_TAG_START.to_string()
}

fn default_tag_end() -> String {
	DEFAULT_TAG_END.to_string()
}

impl SnipgenConfig {
	/// Parse a config from TOML text. `path` is only used for error context.
	pub fn from_toml_str(content: &str, path: &Path) -> SnipgenResult<Self> {
		toml::from_str(content).map_err(|err| SnipgenError::ConfigParse {
			path: path.display().to_string(),
			reason: err.to_string(),
		})
	}

	/// Load the `snipgen.toml` in `dir`, if present.
	pub fn load_dir(dir: &Path) -> SnipgenResult<Option<Self>> {
		let path = dir.join(CONFIG_FILE);
		if !path.is_file() {
			return Ok(None);
		}
		let content = std::fs::read_to_string(&path)?;
		Self::from_toml_str(&content, &path).map(Some)
	}
}
