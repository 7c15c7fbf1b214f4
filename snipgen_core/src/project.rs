use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Emitter;
use crate::Scope;
use crate::Section;
use crate::SnipgenError;
use crate::SnipgenResult;
use crate::SnippetRegistry;
use crate::TagPair;
use crate::config::CONFIG_FILE;
use crate::config::DEFAULT_INDENT;
use crate::config::SnipgenConfig;
use crate::parser::SnippetRegion;
use crate::parser::parse_file;
use crate::parser::scan_str;

/// Find the directory closest to `start` that is a project root: the nearest
/// ancestor containing a `snipgen.toml` or a `.git` entry.
pub fn find_project_root(start: &Path) -> SnipgenResult<PathBuf> {
	for dir in start.ancestors() {
		if dir.join(CONFIG_FILE).exists() || dir.join(".git").exists() {
			return Ok(dir.to_path_buf());
		}
	}
	Err(SnipgenError::ProjectRootNotFound {
		start: start.display().to_string(),
	})
}

/// Options for a [`run_project`] pass.
#[derive(Debug, Default)]
pub struct RunOptions {
	/// Marker tokens to use, overriding the project config.
	pub tags: Option<TagPair>,
}

/// Counters reported by a [`run_project`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
	/// Files rewritten in place (whether or not any region changed).
	pub files_rewritten: usize,
	/// Snippet callbacks invoked across all files.
	pub snippets_run: usize,
}

/// Rewrite every manifest-listed file under `root`.
///
/// Directories are visited depth-first, children before the directory's own
/// files. Each directory with a `snipgen.toml` manifest contributes a derived
/// [`Scope`] layer (its `[scope]` bindings), a derived indent layer (its
/// `[indent]` overrides), and a list of files to rewrite; directories named
/// in `exclude` are skipped. Per file, a further scope layer is derived and
/// the `$file` and `$snippet` bindings are installed before each snippet
/// callback runs. Marker names resolve against `registry`; an unknown name
/// is a definite error.
///
/// Marker tokens come from `options.tags` when set, otherwise from the root
/// config's `[parse]` section, otherwise the defaults.
pub fn run_project(
	root: &Path,
	registry: &SnippetRegistry,
	root_scope: Scope,
	options: RunOptions,
) -> SnipgenResult<RunSummary> {
	// resolve in case `root` is a relative path like `.`
	let root = root.canonicalize()?;
	let root_config = SnipgenConfig::load_dir(&root)?;

	let tags = match options.tags {
		Some(tags) => tags,
		None => {
			root_config
				.as_ref()
				.map_or_else(TagPair::default, |config| config.parse.tag_pair())
		}
	};
	debug!(start = %tags.start, end = %tags.end, "marker tokens");

	let mut indent_base = Scope::new();
	indent_base.insert("", Value::String(DEFAULT_INDENT.to_string()));

	let mut summary = RunSummary::default();
	let mut ctx = WalkCtx {
		root: &root,
		registry,
		tags: &tags,
		summary: &mut summary,
	};
	visit_dir(
		&root,
		root_config,
		&Arc::new(root_scope),
		&Arc::new(indent_base),
		&mut ctx,
	)?;
	Ok(summary)
}

struct WalkCtx<'a> {
	root: &'a Path,
	registry: &'a SnippetRegistry,
	tags: &'a TagPair,
	summary: &'a mut RunSummary,
}

fn visit_dir(
	dir: &Path,
	config: Option<SnipgenConfig>,
	parent_scope: &Arc<Scope>,
	parent_indent: &Arc<Scope>,
	ctx: &mut WalkCtx<'_>,
) -> SnipgenResult<()> {
	let mut scope = Scope::derive(parent_scope);
	let mut indent = None;
	let mut exclude: &[String] = &[];

	if let Some(config) = &config {
		scope.extend(config.scope.clone());
		exclude = &config.exclude;

		if config.indent.default.is_some() || !config.indent.extensions.is_empty() {
			let mut layer = Scope::derive(parent_indent);
			if let Some(default) = &config.indent.default {
				layer.insert("", Value::String(default.clone()));
			}
			for (ext, unit) in &config.indent.extensions {
				layer.insert(ext.clone(), Value::String(unit.clone()));
			}
			indent = Some(Arc::new(layer));
		}
	}

	let scope = Arc::new(scope);
	let indent = indent.unwrap_or_else(|| Arc::clone(parent_indent));

	// depth-first: children before this directory's own files
	let mut children = Vec::new();
	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		if !entry.file_type()?.is_dir() {
			continue;
		}
		let name = entry.file_name();
		let Some(name) = name.to_str() else {
			continue;
		};
		if name.starts_with('.') || exclude.iter().any(|excluded| excluded == name) {
			continue;
		}
		children.push(entry.path());
	}
	children.sort();
	for child in children {
		let child_config = SnipgenConfig::load_dir(&child)?;
		visit_dir(&child, child_config, &scope, &indent, ctx)?;
	}

	let Some(config) = config else {
		return Ok(());
	};

	let manifest = dir.join(CONFIG_FILE);
	for file in &config.files {
		if Path::new(file).file_name() != Some(OsStr::new(file.as_str())) {
			return Err(SnipgenError::InvalidFileEntry {
				entry: file.clone(),
				manifest: manifest.display().to_string(),
			});
		}
		let path = dir.join(file);
		if !path.is_file() {
			return Err(SnipgenError::MissingParseFile {
				file: path.display().to_string(),
				manifest: manifest.display().to_string(),
			});
		}
		rewrite_file(&path, &scope, &indent, ctx)?;
	}

	Ok(())
}

/// Rewrite one file in place, resolving each detected region against the
/// registry and rendering its section through an [`Emitter`] configured with
/// the region's whitespace prefix and the file's indent unit.
fn rewrite_file(
	path: &Path,
	dir_scope: &Arc<Scope>,
	indent: &Arc<Scope>,
	ctx: &mut WalkCtx<'_>,
) -> SnipgenResult<()> {
	let relative = path
		.strip_prefix(ctx.root)
		.unwrap_or(path)
		.display()
		.to_string();
	info!(file = %relative, "rewriting");

	let indent_by = resolve_indent(indent, path);
	let mut file_scope = Scope::derive(dir_scope);
	file_scope.insert("$file", Value::String(relative.clone()));

	let registry = ctx.registry;
	let mut snippets_run = 0usize;
	parse_file(path, path, ctx.tags, |found, _src, out| {
		let Some(snippet_fn) = registry.get(&found.name) else {
			return Err(SnipgenError::UndefinedSnippet {
				snippet: found.name.clone(),
				file: relative.clone(),
			});
		};
		debug!(snippet = %found.name, file = %relative, "running snippet");
		file_scope.insert("$snippet", Value::String(found.name.clone()));

		let mut section = Section::new();
		let section_root = section.root();
		snippet_fn(&mut section, section_root, &file_scope, &found.argument).map_err(|err| {
			SnipgenError::SnippetFailed {
				snippet: found.name.clone(),
				file: relative.clone(),
				line_start: found.line_start,
				reason: err.to_string(),
			}
		})?;

		let emitter = Emitter::new(found.prefix.clone(), indent_by.clone());
		emitter.render(&section, out)?;
		snippets_run += 1;
		Ok(())
	})?;

	ctx.summary.files_rewritten += 1;
	ctx.summary.snippets_run += snippets_run;
	Ok(())
}

/// Resolve the indent unit for `path` from the layered indent map: the
/// file's extension first, then the `""` fallback entry.
fn resolve_indent(indent: &Scope, path: &Path) -> String {
	let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
	let unit = indent
		.get(ext)
		.and_then(Value::as_str)
		.or_else(|| indent.get("").and_then(Value::as_str));
	unit.map_or_else(|| DEFAULT_INDENT.to_string(), ToString::to_string)
}

/// A region found by [`scan_project`], tagged with its file.
#[derive(Debug, Clone, Serialize)]
pub struct FoundRegion {
	pub file: PathBuf,
	#[serde(flatten)]
	pub region: SnippetRegion,
}

/// A file that failed region validation during [`scan_project`].
#[derive(Debug)]
pub struct ScanProblem {
	pub file: PathBuf,
	pub error: SnipgenError,
}

/// Result of a scan-only pass over a project.
#[derive(Debug, Default)]
pub struct ScanReport {
	pub regions: Vec<FoundRegion>,
	pub problems: Vec<ScanProblem>,
}

impl ScanReport {
	/// True when every scanned region was well formed.
	pub fn is_ok(&self) -> bool {
		self.problems.is_empty()
	}
}

/// Scan every file under `root` for snippet regions without rewriting
/// anything.
///
/// The walk honours `.gitignore` and skips hidden entries. Malformed regions
/// (unclosed, nested, undecodable argument) and unreadable files are
/// collected per file instead of aborting the pass, so one report covers the
/// whole project. Files that
/// do not contain the start token are skipped cheaply, and the
/// `snipgen.toml` manifests themselves are never scanned since they may
/// quote the marker tokens.
pub fn scan_project(root: &Path, tags: &TagPair) -> SnipgenResult<ScanReport> {
	let mut report = ScanReport::default();

	for entry in ignore::WalkBuilder::new(root).build() {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) => {
				warn!(error = %err, "skipping unreadable entry");
				continue;
			}
		};
		if !entry.file_type().is_some_and(|ft| ft.is_file()) {
			continue;
		}
		if entry.file_name() == OsStr::new(CONFIG_FILE) {
			continue;
		}
		let path = entry.path();
		let bytes = match std::fs::read(path) {
			Ok(bytes) => bytes,
			Err(err) => {
				report.problems.push(ScanProblem {
					file: path.to_path_buf(),
					error: SnipgenError::Io(err),
				});
				continue;
			}
		};
		let content = String::from_utf8_lossy(&bytes);
		if !content.contains(&tags.start) {
			continue;
		}

		match scan_str(&content, path, tags) {
			Ok(regions) => {
				report.regions.extend(regions.into_iter().map(|region| {
					FoundRegion {
						file: path.to_path_buf(),
						region,
					}
				}));
			}
			Err(error) => {
				report.problems.push(ScanProblem {
					file: path.to_path_buf(),
					error,
				});
			}
		}
	}

	report.regions.sort_by(|a, b| {
		(&a.file, a.region.line_start).cmp(&(&b.file, b.region.line_start))
	});
	Ok(report)
}
