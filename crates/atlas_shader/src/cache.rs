//! Program Cache
//!
//! Per-resource memo of build outcomes keyed by [`VariantKey`]. Both
//! successes and permanent failures are stored, so a broken variant is not
//! recompiled until the resource changes. Pending builds are never stored.
//!
//! Invalidation is wholesale: [`ProgramCache::clear`] drops every variant at
//! once, together with the recorded dependency set.

use atlas_core::{ProgramId, ShaderError, VariantKey, VariantState};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::resolver::Dependency;

#[derive(Debug, Default)]
pub struct ProgramCache {
    entries: FxHashMap<VariantKey, Result<ProgramId, ShaderError>>,
    /// Everything any build looked at since the last clear, pending ones
    /// included.
    dependencies: FxHashSet<Dependency>,
}

impl ProgramCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: VariantKey) -> Option<&Result<ProgramId, ShaderError>> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: VariantKey, outcome: Result<ProgramId, ShaderError>) {
        self.entries.insert(key, outcome);
    }

    pub fn record_dependencies(&mut self, dependencies: impl IntoIterator<Item = Dependency>) {
        self.dependencies.extend(dependencies);
    }

    #[must_use]
    pub fn depends_on(&self, dependency: &Dependency) -> bool {
        self.dependencies.contains(dependency)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter()
    }

    #[must_use]
    pub fn state(&self, key: VariantKey) -> VariantState {
        match self.entries.get(&key) {
            None => VariantState::Unassembled,
            Some(Ok(id)) => VariantState::Compiled(*id),
            Some(Err(error)) => VariantState::Failed(error.clone()),
        }
    }

    /// Drops every cached outcome and the dependency set.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dependencies.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
