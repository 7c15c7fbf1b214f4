use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// A binding slot in a [`Scope`] layer.
#[derive(Debug, Clone)]
enum ScopeEntry {
	Value(Value),
	/// Hides any binding of the same key in an outer scope without touching
	/// the outer scope itself.
	Tombstone,
}

/// A layered key/value environment with parent delegation.
///
/// Lookup walks from the current scope outward through its parents until a
/// binding or a tombstone is found. A derived scope can add, override and
/// delete entries without ever mutating its parents; parents are shared
/// read-only behind an [`Arc`], so many children can hang off the same outer
/// scope.
///
/// Scopes form a tree mirroring the directory/file traversal of a project:
/// the engine derives one per directory and per file, and snippet callbacks
/// only ever read from the scope they are handed.
#[derive(Debug, Default)]
pub struct Scope {
	entries: HashMap<String, ScopeEntry>,
	outer: Option<Arc<Scope>>,
}

impl Scope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a child scope with `parent` as its outer scope.
	pub fn derive(parent: &Arc<Self>) -> Self {
		Self {
			entries: HashMap::new(),
			outer: Some(Arc::clone(parent)),
		}
	}

	/// Bind `key` in this scope, shadowing any outer binding.
	pub fn insert(&mut self, key: impl Into<String>, value: Value) {
		self.entries.insert(key.into(), ScopeEntry::Value(value));
	}

	/// Delete `key` from the point of view of this scope and its children.
	///
	/// Installs a tombstone rather than removing anything: outer scopes are
	/// shared and must not be modified, and determining whether the key is
	/// bound at all would cost a full walk up the chain anyway.
	pub fn remove(&mut self, key: impl Into<String>) {
		self.entries.insert(key.into(), ScopeEntry::Tombstone);
	}

	/// Look up `key`, walking outward through parent scopes. A tombstone in
	/// an inner scope hides outer bindings.
	pub fn get(&self, key: &str) -> Option<&Value> {
		let mut scope = self;
		loop {
			if let Some(entry) = scope.entries.get(key) {
				return match entry {
					ScopeEntry::Value(value) => Some(value),
					ScopeEntry::Tombstone => None,
				};
			}
			scope = scope.outer.as_deref()?;
		}
	}

	/// True if `key` resolves to a binding (and not a tombstone).
	pub fn contains(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Bind every entry of `other` in this scope.
	pub fn extend<K: Into<String>>(&mut self, other: impl IntoIterator<Item = (K, Value)>) {
		for (key, value) in other {
			self.insert(key, value);
		}
	}

	/// Flatten the whole chain into a single map, innermost bindings winning
	/// and tombstoned keys omitted.
	pub fn to_map(&self) -> BTreeMap<String, Value> {
		let mut layers = Vec::new();
		let mut scope = Some(self);
		while let Some(s) = scope {
			layers.push(&s.entries);
			scope = s.outer.as_deref();
		}

		let mut map = BTreeMap::new();
		// outermost first, so inner layers override
		for layer in layers.into_iter().rev() {
			for (key, entry) in layer {
				match entry {
					ScopeEntry::Value(value) => {
						map.insert(key.clone(), value.clone());
					}
					ScopeEntry::Tombstone => {
						map.remove(key);
					}
				}
			}
		}
		map
	}
}
