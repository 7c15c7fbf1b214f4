use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::AnyEmptyResult;
use crate::Scope;
use crate::Section;
use crate::SectionId;

/// A snippet implementation: fills the given section node with generated
/// output, reading from the scope and the decoded snippet argument.
///
/// Snippets must not perform I/O on the file being rewritten; they only
/// write into the section, which the engine renders into the output stream.
pub type SnippetFn =
	Arc<dyn Fn(&mut Section, SectionId, &Scope, &Value) -> AnyEmptyResult + Send + Sync>;

/// A layered mapping from snippet name to implementation.
///
/// The registry replaces attribute-style marking of generation callables with
/// an explicit table: embedders register each snippet under one or more names
/// and hand the registry to the engine, which resolves marker names against
/// it. Like [`Scope`], registries can be derived so that an inner directory
/// context overrides an outer definition of the same name without touching
/// the outer registry.
#[derive(Default)]
pub struct SnippetRegistry {
	entries: HashMap<String, SnippetFn>,
	outer: Option<Arc<SnippetRegistry>>,
}

impl SnippetRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a child registry layered over `parent`.
	pub fn derive(parent: &Arc<Self>) -> Self {
		Self {
			entries: HashMap::new(),
			outer: Some(Arc::clone(parent)),
		}
	}

	/// Register a snippet under `name`, shadowing any outer definition.
	/// Registering the same closure under several names gives it aliases.
	pub fn register<F>(&mut self, name: impl Into<String>, snippet: F)
	where
		F: Fn(&mut Section, SectionId, &Scope, &Value) -> AnyEmptyResult + Send + Sync + 'static,
	{
		self.entries.insert(name.into(), Arc::new(snippet));
	}

	/// Register an already-shared snippet handle under `name`.
	pub fn register_arc(&mut self, name: impl Into<String>, snippet: SnippetFn) {
		self.entries.insert(name.into(), snippet);
	}

	/// Resolve `name`, walking outward through parent registries.
	pub fn get(&self, name: &str) -> Option<SnippetFn> {
		let mut registry = self;
		loop {
			if let Some(snippet) = registry.entries.get(name) {
				return Some(Arc::clone(snippet));
			}
			registry = registry.outer.as_deref()?;
		}
	}

	/// True if `name` resolves in this registry or any parent.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Names registered in this layer only (not parents).
	pub fn local_names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}
}

impl std::fmt::Debug for SnippetRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut names: Vec<_> = self.entries.keys().collect();
		names.sort();
		f.debug_struct("SnippetRegistry")
			.field("entries", &names)
			.field("outer", &self.outer)
			.finish()
	}
}
