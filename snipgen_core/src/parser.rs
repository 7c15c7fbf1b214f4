use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::SnipgenError;
use crate::SnipgenResult;

/// Default start-marker token.
pub const DEFAULT_TAG_START: &str = "[[start";
/// Default end-marker token.
pub const DEFAULT_TAG_END: &str = "end]]";

/// Suffix used for the temporary file when rewriting a file in place, so a
/// concurrent scan never picks the half-written copy up as a source.
const TMP_SUFFIX: &str = ".snipgen.tmp";

/// The pair of marker tokens delimiting a snippet region.
///
/// The start and end token may be distinct strings or textually identical;
/// see [`parse_file`] for how identical tokens are disambiguated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPair {
	pub start: String,
	pub end: String,
}

impl TagPair {
	pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
		Self {
			start: start.into(),
			end: end.into(),
		}
	}
}

impl Default for TagPair {
	fn default() -> Self {
		Self::new(DEFAULT_TAG_START, DEFAULT_TAG_END)
	}
}

/// A detected snippet region, handed to the rewrite callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetMatch {
	/// The snippet name token following the start marker.
	pub name: String,
	/// The leading whitespace of the start-marker line, used to re-indent
	/// the generated output.
	pub prefix: String,
	/// The decoded snippet argument; `Value::Null` when absent.
	pub argument: Value,
	/// 1-indexed line number of the start-marker line.
	pub line_start: usize,
}

/// A snippet region found by a scan-only pass (no rewriting).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetRegion {
	pub name: String,
	pub argument: Value,
	pub prefix: String,
	pub line_start: usize,
	pub line_end: usize,
}

/// An open region while scanning for its end marker.
struct OpenRegion {
	name: String,
	/// Everything on the start-marker line before the start token. The end
	/// marker must be this prefix followed by the end token.
	raw_prefix: String,
	/// Leading whitespace of `raw_prefix`, passed to the callback.
	ws_prefix: String,
	argument: Value,
	line_start: usize,
}

/// Rewrite the snippet regions of `src` into `dst`.
///
/// The file is streamed line by line. Lines outside marked regions are
/// copied byte-for-byte. When a start marker is found, its line is copied
/// verbatim, the old region contents are dropped, and once the matching end
/// marker line is found `on_snippet` is invoked with the detected region and
/// a writer for the output stream; the end-marker line is then copied
/// verbatim, so the markers themselves are always preserved.
///
/// All output goes to a temporary file in `dst`'s directory, which only
/// replaces `dst` by an atomic rename after the whole file has been scanned
/// and written. On any error the temporary file is removed and the original
/// file is left untouched. Symbolic-link sources are skipped entirely.
///
/// When the start and end tokens are textually identical, the first later
/// line beginning with the start-line prefix followed by the token closes
/// the region; a marker pair on a single line is not recognized.
pub fn parse_file<F>(
	src: &Path,
	dst: &Path,
	tags: &TagPair,
	mut on_snippet: F,
) -> SnipgenResult<()>
where
	F: FnMut(&SnippetMatch, &Path, &mut dyn Write) -> SnipgenResult<()>,
{
	if std::fs::symlink_metadata(src)?.file_type().is_symlink() {
		debug!(src = %src.display(), "skipping symlink");
		return Ok(());
	}

	let dst_dir = match dst.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let tmp = tempfile::Builder::new()
		.prefix(".snipgen-")
		.suffix(TMP_SUFFIX)
		.tempfile_in(dst_dir)?;
	let mut out = BufWriter::new(tmp);

	let mut reader = BufReader::new(File::open(src)?);
	let mut line = Vec::new();
	let mut lineno: usize = 0;
	let mut region: Option<OpenRegion> = None;

	loop {
		line.clear();
		let read = reader.read_until(b'\n', &mut line)?;
		if read == 0 {
			if let Some(open) = region {
				return Err(SnipgenError::UnclosedSnippet {
					file: src.display().to_string(),
					snippet: open.name,
					line_start: open.line_start,
					line_err: lineno,
				});
			}
			break;
		}
		lineno += 1;
		let text = String::from_utf8_lossy(&line);

		match &region {
			None => {
				out.write_all(&line)?;
				if let Some(ndx) = text.find(&tags.start) {
					let open = parse_start_line(src, &text, ndx, tags, lineno)?;
					debug!(
						snippet = %open.name,
						prefix = ?open.ws_prefix,
						line = lineno,
						"snippet start"
					);
					region = Some(open);
				}
			}
			Some(open) => {
				let end_pat = format!("{}{}", open.raw_prefix, tags.end);
				if text.starts_with(&end_pat) {
					let found = SnippetMatch {
						name: open.name.clone(),
						prefix: open.ws_prefix.clone(),
						argument: open.argument.clone(),
						line_start: open.line_start,
					};
					on_snippet(&found, src, &mut out)?;
					out.write_all(&line)?;
					region = None;
				} else if text.contains(&tags.start) {
					return Err(SnipgenError::NestedSnippet {
						file: src.display().to_string(),
						snippet: open.name.clone(),
						line_start: open.line_start,
						line_err: lineno,
					});
				}
				// other lines inside the region are the old generated
				// contents and are dropped
			}
		}
	}

	let tmp = out
		.into_inner()
		.map_err(std::io::IntoInnerError::into_error)?;
	tmp
		.persist(dst)
		.map_err(|err| SnipgenError::Io(err.error))?;
	Ok(())
}

/// Scan `content` for snippet regions without rewriting anything.
///
/// Reports the same malformed-region errors as [`parse_file`] and returns
/// every well-formed region with its decoded argument and line span. Used by
/// the project validation pass and the CLI.
pub fn scan_str(content: &str, file: &Path, tags: &TagPair) -> SnipgenResult<Vec<SnippetRegion>> {
	let mut regions = Vec::new();
	let mut region: Option<OpenRegion> = None;
	let mut lineno: usize = 0;

	for text in content.lines() {
		lineno += 1;
		match &region {
			None => {
				if let Some(ndx) = text.find(&tags.start) {
					region = Some(parse_start_line(file, text, ndx, tags, lineno)?);
				}
			}
			Some(open) => {
				let end_pat = format!("{}{}", open.raw_prefix, tags.end);
				if text.starts_with(&end_pat) {
					regions.push(SnippetRegion {
						name: open.name.clone(),
						argument: open.argument.clone(),
						prefix: open.ws_prefix.clone(),
						line_start: open.line_start,
						line_end: lineno,
					});
					region = None;
				} else if text.contains(&tags.start) {
					return Err(SnipgenError::NestedSnippet {
						file: file.display().to_string(),
						snippet: open.name.clone(),
						line_start: open.line_start,
						line_err: lineno,
					});
				}
			}
		}
	}

	if let Some(open) = region {
		return Err(SnipgenError::UnclosedSnippet {
			file: file.display().to_string(),
			snippet: open.name,
			line_start: open.line_start,
			line_err: lineno,
		});
	}

	Ok(regions)
}

/// Split a start-marker line into its prefix, name token, and decoded
/// argument. `ndx` is the byte offset of the start token within `text`.
fn parse_start_line(
	file: &Path,
	text: &str,
	ndx: usize,
	tags: &TagPair,
	lineno: usize,
) -> SnipgenResult<OpenRegion> {
	let raw_prefix = &text[..ndx];
	let ws_prefix = &raw_prefix[..raw_prefix.len() - raw_prefix.trim_start().len()];
	let rest = text[ndx + tags.start.len()..].trim();

	let (name, raw_arg) = match rest.split_once(char::is_whitespace) {
		Some((name, raw)) => (name, raw.trim()),
		None => (rest, ""),
	};

	let argument = decode_argument(raw_arg).map_err(|reason| SnipgenError::SnippetArgument {
		file: file.display().to_string(),
		snippet: name.to_string(),
		line: lineno,
		raw: raw_arg.to_string(),
		reason,
	})?;

	Ok(OpenRegion {
		name: name.to_string(),
		raw_prefix: raw_prefix.to_string(),
		ws_prefix: ws_prefix.to_string(),
		argument,
		line_start: lineno,
	})
}

/// Decode the raw argument text following the snippet name. Empty text and
/// the literal `null` decode to `Value::Null`; anything else must be valid
/// JSON.
fn decode_argument(raw: &str) -> Result<Value, String> {
	if raw.is_empty() || raw == "null" {
		return Ok(Value::Null);
	}
	serde_json::from_str(raw).map_err(|err| err.to_string())
}
