use crate::SnipgenError;
use crate::SnipgenResult;

/// Handle to one node in a [`Section`] arena. Copyable, cheap, and only
/// meaningful for the `Section` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(usize);

/// One element of a section buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SectionElem {
	/// A literal text fragment. Never contains a real `\n` — embedded
	/// newlines are escaped on the way in.
	Literal(String),
	/// An unconditional line break.
	Newline,
	/// A line break only if the buffer is not already at a line start.
	Freshline,
	Indent,
	Dedent,
	/// At least this many blank lines, if surrounded by content.
	Padding(usize),
	/// A nested placeholder section, spliced in at this point.
	Child(SectionId),
}

#[derive(Debug, Default)]
struct SectionNode {
	elems: Vec<SectionElem>,
	/// Indentation level relative to this node's start. Used to reject a
	/// dedent below the node's own starting level at call time.
	indent_level: usize,
}

/// A deferred, indentation-aware text buffer.
///
/// A section provides two capabilities on top of plain string building:
///
/// 1. Indentation is tracked as a level, adjusted with [`indent`] and
///    [`dedent`], so helper code never embeds absolute indentation into the
///    strings it writes.
/// 2. [`add_section`] registers a nested placeholder whose contents can be
///    filled in later, yet still render at the placeholder's position. This
///    makes it possible to produce the final output out of order, e.g. adding
///    variable declarations to the top of a function after its body has been
///    written.
///
/// Internally the tree is an arena: nodes are stored in one `Vec` and refer
/// to each other by [`SectionId`], so the parent and any number of child
/// placeholders can be written to in any interleaved order through the same
/// `&mut Section`. A section is write-only — previously appended text cannot
/// be changed — and is consumed once by [`Emitter::render`].
///
/// [`indent`]: Section::indent
/// [`dedent`]: Section::dedent
/// [`add_section`]: Section::add_section
/// [`Emitter::render`]: crate::Emitter::render
#[derive(Debug)]
pub struct Section {
	nodes: Vec<SectionNode>,
}

impl Section {
	/// Create an empty section with a single root node.
	pub fn new() -> Self {
		Self {
			nodes: vec![SectionNode::default()],
		}
	}

	/// Handle to the root node.
	pub fn root(&self) -> SectionId {
		SectionId(0)
	}

	/// Append one literal fragment to `id` without any separator.
	///
	/// Embedded newline characters are escaped to the visible two-character
	/// sequence `\n` rather than interpreted as line breaks; use
	/// [`newline`](Section::newline) or [`emitln`](Section::emitln) to end
	/// lines. Empty fragments are dropped.
	pub fn emit(&mut self, id: SectionId, text: impl AsRef<str>) {
		let text = text.as_ref();
		if text.is_empty() {
			return;
		}
		let escaped = if text.contains('\n') {
			text.replace('\n', "\\n")
		} else {
			text.to_string()
		};
		self.nodes[id.0].elems.push(SectionElem::Literal(escaped));
	}

	/// Append a literal fragment followed by a line break.
	pub fn emitln(&mut self, id: SectionId, text: impl AsRef<str>) {
		self.emit(id, text);
		self.newline(id);
	}

	/// Emit each fragment as its own line: `emit_lines(id, &["a", "b"])` is
	/// `emitln(id, "a")` followed by `emitln(id, "b")`.
	pub fn emit_lines(&mut self, id: SectionId, lines: &[&str]) {
		for line in lines {
			self.emitln(id, line);
		}
	}

	/// Append an unconditional line break.
	pub fn newline(&mut self, id: SectionId) {
		self.nodes[id.0].elems.push(SectionElem::Newline);
	}

	/// Append a line break only if the node is not already at the start of a
	/// line. Idempotent when called repeatedly with no text in between.
	pub fn freshline(&mut self, id: SectionId) {
		if matches!(
			self.nodes[id.0].elems.last(),
			Some(SectionElem::Newline | SectionElem::Freshline)
		) {
			return;
		}
		self.nodes[id.0].elems.push(SectionElem::Freshline);
	}

	/// Indent all subsequent lines of `id` one level more. Forces a fresh
	/// line first, so a partially written line is terminated.
	pub fn indent(&mut self, id: SectionId) {
		self.freshline(id);
		let node = &mut self.nodes[id.0];
		node.indent_level += 1;
		node.elems.push(SectionElem::Indent);
	}

	/// Indent all subsequent lines of `id` one level less. Forces a fresh
	/// line first.
	///
	/// Dedenting below the level the node started at is rejected here, at the
	/// offending call, not at render time.
	pub fn dedent(&mut self, id: SectionId) -> SnipgenResult<()> {
		if self.nodes[id.0].indent_level == 0 {
			return Err(SnipgenError::IndentUnderflow);
		}
		self.freshline(id);
		let node = &mut self.nodes[id.0];
		node.indent_level -= 1;
		node.elems.push(SectionElem::Dedent);
		Ok(())
	}

	/// Request at least `nlines` blank lines at this point.
	///
	/// Padding only takes effect between content: at the very start or very
	/// end of the rendered output it collapses to nothing. When two requests
	/// would apply at the same point the larger one wins; they are never
	/// additive.
	pub fn padding(&mut self, id: SectionId, nlines: usize) {
		self.nodes[id.0].elems.push(SectionElem::Padding(nlines));
	}

	/// Register a nested placeholder at the current end of `id` and return
	/// its handle.
	///
	/// Everything later written to the returned child renders at this point
	/// in the parent, between whatever the parent wrote before and after the
	/// call, regardless of the relative order of the writes.
	pub fn add_section(&mut self, id: SectionId) -> SectionId {
		self.freshline(id);
		let child = SectionId(self.nodes.len());
		self.nodes.push(SectionNode::default());
		self.nodes[id.0].elems.push(SectionElem::Child(child));
		child
	}

	/// True when node `id` has no elements at all.
	pub fn is_empty(&self, id: SectionId) -> bool {
		self.nodes[id.0].elems.is_empty()
	}

	/// Depth-first walk over all elements reachable from the root, with
	/// child placeholders resolved in place.
	pub(crate) fn elements(&self) -> SectionElements<'_> {
		SectionElements {
			section: self,
			stack: vec![(0, 0)],
		}
	}
}

impl Default for Section {
	fn default() -> Self {
		Self::new()
	}
}

/// Iterator over the flattened element sequence of a [`Section`] tree.
pub(crate) struct SectionElements<'a> {
	section: &'a Section,
	/// (node index, next element index) frames, innermost last.
	stack: Vec<(usize, usize)>,
}

impl<'a> Iterator for SectionElements<'a> {
	type Item = &'a SectionElem;

	fn next(&mut self) -> Option<Self::Item> {
		let section = self.section;
		loop {
			let Some(frame) = self.stack.last_mut() else {
				return None;
			};
			let (node, idx) = (frame.0, frame.1);
			let elems = &section.nodes[node].elems;
			if idx >= elems.len() {
				self.stack.pop();
				continue;
			}
			frame.1 += 1;
			match &elems[idx] {
				SectionElem::Child(child) => {
					self.stack.push((child.0, 0));
				}
				elem => return Some(elem),
			}
		}
	}
}
