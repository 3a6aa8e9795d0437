//! Snippet Registry
//!
//! Named reusable GLSL fragments referenced by `#pragma snippet <name>` or by
//! an extension-less `#pragma include "<name>"`. Lookups are synchronous: a
//! snippet is either registered or missing, never pending.

use rustc_hash::FxHashMap;

use crate::builtin;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFragment {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default)]
pub struct SnippetRegistry {
    snippets: FxHashMap<String, SourceFragment>,
}

impl SnippetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the embedded snippet set.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, code) in builtin::snippets() {
            registry.register(name, code);
        }
        registry
    }

    /// Registers or replaces a snippet, returning the replaced one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> Option<SourceFragment> {
        let name = name.into();
        let fragment = SourceFragment {
            name: name.clone(),
            code: code.into(),
        };
        self.snippets.insert(name, fragment)
    }

    pub fn remove(&mut self, name: &str) -> Option<SourceFragment> {
        self.snippets.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SourceFragment> {
        self.snippets.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.snippets.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}
