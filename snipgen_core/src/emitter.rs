use std::io::Write;

use crate::SnipgenResult;
use crate::section::Section;
use crate::section::SectionElem;

/// Stateless renderer that linearizes a [`Section`] tree into a byte stream.
///
/// Each rendered line is `prefix`, then `indent_by` repeated once per current
/// indentation level, then the line's literal content. Newline, freshline and
/// padding markers between literals collapse into a concrete number of line
/// breaks at the next literal. Lines that carry no literal content are never
/// indented, and trailing padding produces nothing.
#[derive(Debug, Clone)]
pub struct Emitter {
	/// Base prefix written at the start of every non-empty line. For snippet
	/// rewriting this is the leading whitespace of the start-marker line.
	prefix: String,
	/// The string written once per indentation level, e.g. four spaces or a
	/// tab.
	indent_by: String,
}

impl Emitter {
	pub fn new(prefix: impl Into<String>, indent_by: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			indent_by: indent_by.into(),
		}
	}

	/// Render `section` into `out`.
	///
	/// Line breaks are resolved lazily: newline and freshline markers are
	/// counted, padding keeps only the largest pending request, and the
	/// accumulated breaks are flushed when the next literal arrives. At that
	/// point a pending padding of `n` expands to `max(pending_newlines, n +
	/// 1)` newline characters, which yields exactly `n` blank lines between
	/// the surrounding literals. Padding before the first literal, or with no
	/// literal after it, is dropped; explicitly requested trailing newlines
	/// are flushed at the end.
	pub fn render(&self, section: &Section, out: &mut dyn Write) -> std::io::Result<()> {
		let mut fresh = true;
		let mut padding: usize = 0;
		let mut padding_pending = false;
		let mut nls: usize = 0;
		let mut level: usize = 0;
		let mut wrote_literal = false;

		for elem in section.elements() {
			match elem {
				SectionElem::Padding(nlines) => {
					if !wrote_literal || (padding_pending && *nlines < padding) {
						continue;
					}
					fresh = true;
					padding = *nlines;
					padding_pending = true;
				}
				SectionElem::Newline => {
					nls += 1;
					fresh = true;
				}
				SectionElem::Freshline => {
					if !fresh {
						nls += 1;
						fresh = true;
					}
				}
				SectionElem::Indent => {
					level += 1;
					if !fresh {
						nls = 1;
						fresh = true;
					}
				}
				SectionElem::Dedent => {
					level = level.saturating_sub(1);
					if !fresh {
						nls = 1;
						fresh = true;
					}
				}
				SectionElem::Literal(text) => {
					if padding_pending {
						write_newlines(out, nls.max(padding + 1))?;
						padding = 0;
						padding_pending = false;
						nls = 0;
						fresh = true;
					} else if nls > 0 {
						write_newlines(out, nls)?;
						nls = 0;
						fresh = true;
					}
					if fresh {
						fresh = false;
						out.write_all(self.prefix.as_bytes())?;
						for _ in 0..level {
							out.write_all(self.indent_by.as_bytes())?;
						}
					}
					out.write_all(text.as_bytes())?;
					wrote_literal = true;
				}
				SectionElem::Child(_) => {
					// resolved by Section::elements
				}
			}
		}

		if nls > 0 {
			write_newlines(out, nls)?;
		}

		Ok(())
	}

	/// Render `section` to an owned string.
	pub fn render_to_string(&self, section: &Section) -> SnipgenResult<String> {
		let mut buf = Vec::new();
		self.render(section, &mut buf)?;
		Ok(String::from_utf8_lossy(&buf).into_owned())
	}
}

impl Default for Emitter {
	fn default() -> Self {
		Self::new("", " ")
	}
}

fn write_newlines(out: &mut dyn Write, n: usize) -> std::io::Result<()> {
	for _ in 0..n {
		out.write_all(b"\n")?;
	}
	Ok(())
}
