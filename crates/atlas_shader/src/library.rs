//! Shader Library
//!
//! The registry every [`ShaderSource`] lives in, and the context their
//! programs are built against.
//!
//! The library owns:
//!
//! - the resources, addressed by name or [`ShaderHandle`]
//! - the [`SnippetRegistry`]
//! - the [`EventBus`] announcing changes and failures
//! - the injected collaborators: a [`ResourceLoader`] and an optional
//!   [`ScriptHost`]
//!
//! Dependencies are tracked per resource. When a resource is inserted,
//! updated or removed, or a snippet is registered, every resource whose
//! builds looked at it drops its programs and an
//! [`ShaderEvent::Invalidated`] is broadcast. Consumers pull
//! [`ShaderLibrary::program`] again when they see it.

use atlas_core::{
    AtlasError, EventBus, LibrarySettings, ProgramStatus, Result, ShaderError, ShaderEvent, Topic,
};
use flume::Receiver;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SlotMap, new_key_type};

use crate::backend::{ResourceLoader, ScriptHost, ShaderCompiler};
use crate::resolver::{BuildContext, Dependency, SourceLookup};
use crate::snippets::SnippetRegistry;
use crate::source::ShaderSource;

new_key_type! {
    pub struct ShaderHandle;
}

/// Resources by handle, plus the name index.
#[derive(Default)]
pub struct SourceStorage {
    map: SlotMap<ShaderHandle, ShaderSource>,
    lookup: FxHashMap<String, ShaderHandle>,
}

impl SourceStorage {
    fn entry(&self, name: &str) -> Option<(ShaderHandle, &ShaderSource)> {
        let handle = *self.lookup.get(name)?;
        Some((handle, self.map.get(handle)?))
    }
}

impl SourceLookup for SourceStorage {
    fn lookup(&self, name: &str) -> Option<&ShaderSource> {
        self.entry(name).map(|(_, source)| source)
    }
}

pub struct ShaderLibrary {
    settings: LibrarySettings,
    storage: SourceStorage,
    snippets: SnippetRegistry,
    events: EventBus,
    loader: Box<dyn ResourceLoader>,
    script_host: Option<Box<dyn ScriptHost>>,
    /// Names handed to the loader and not delivered yet.
    requested: FxHashSet<String>,
}

impl ShaderLibrary {
    #[must_use]
    pub fn new(settings: LibrarySettings, loader: impl ResourceLoader + 'static) -> Self {
        let snippets = if settings.builtin_snippets {
            SnippetRegistry::with_builtins()
        } else {
            SnippetRegistry::new()
        };

        Self {
            settings,
            storage: SourceStorage::default(),
            snippets,
            events: EventBus::new(),
            loader: Box::new(loader),
            script_host: None,
            requested: FxHashSet::default(),
        }
    }

    /// Installs the host that prepares `js` init scripts.
    #[must_use]
    pub fn with_script_host(mut self, host: impl ScriptHost + 'static) -> Self {
        self.script_host = Some(Box::new(host));
        self
    }

    #[must_use]
    pub fn settings(&self) -> &LibrarySettings {
        &self.settings
    }

    pub fn subscribe(&mut self, topic: Topic) -> Receiver<ShaderEvent> {
        self.events.subscribe(topic)
    }

    #[must_use]
    pub fn snippets(&self) -> &SnippetRegistry {
        &self.snippets
    }

    /// Build context over this library's resources, snippets and settings.
    #[must_use]
    pub fn context(&self) -> BuildContext<'_> {
        BuildContext {
            sources: &self.storage,
            snippets: &self.snippets,
            settings: &self.settings,
        }
    }

    /// Registers or replaces a snippet and invalidates its users.
    pub fn register_snippet(&mut self, name: impl Into<String>, code: impl Into<String>) {
        let name = name.into();
        self.snippets.register(name.clone(), code);
        self.invalidate_dependents(&Dependency::Snippet(name));
    }

    /// Registers a resource delivered by the loader, or reloads an existing
    /// one. The resource is not marked modified.
    pub fn insert(&mut self, name: impl Into<String>, code: impl Into<String>) -> ShaderHandle {
        let name = name.into();
        self.requested.remove(&name);

        let handle = match self.storage.lookup.get(&name).copied() {
            Some(handle) => {
                let changed = self
                    .storage
                    .map
                    .get_mut(handle)
                    .is_some_and(|source| source.load_code(code));
                if !changed {
                    return handle;
                }
                handle
            }
            None => {
                let handle = self
                    .storage
                    .map
                    .insert(ShaderSource::named(name.clone(), code));
                self.storage.lookup.insert(name.clone(), handle);
                handle
            }
        };

        self.source_changed(handle, &name);
        handle
    }

    /// Edits a registered resource. Returns whether the text changed.
    ///
    /// # Errors
    ///
    /// [`AtlasError::SourceNotFound`] when no resource has this name.
    pub fn update(&mut self, name: &str, code: impl Into<String>) -> Result<bool> {
        let (handle, _) = self
            .storage
            .entry(name)
            .ok_or_else(|| AtlasError::SourceNotFound(name.to_string()))?;

        let changed = self
            .storage
            .map
            .get_mut(handle)
            .is_some_and(|source| source.set_code(code));
        if changed {
            self.source_changed(handle, name);
        }
        Ok(changed)
    }

    /// Unregisters a resource and invalidates everything that included it.
    pub fn remove(&mut self, name: &str) -> Option<ShaderSource> {
        let handle = self.storage.lookup.remove(name)?;
        let source = self.storage.map.remove(handle);
        self.invalidate_dependents(&Dependency::Resource(name.to_string()));
        source
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ShaderSource> {
        self.storage.lookup(name)
    }

    #[must_use]
    pub fn handle(&self, name: &str) -> Option<ShaderHandle> {
        self.storage.lookup.get(name).copied()
    }

    #[must_use]
    pub fn get_by_handle(&self, handle: ShaderHandle) -> Option<&ShaderSource> {
        self.storage.map.get(handle)
    }

    /// Clears the modified flag of a resource after the host persisted it.
    pub fn mark_stored(&mut self, name: &str) {
        if let Some(handle) = self.handle(name)
            && let Some(source) = self.storage.map.get_mut(handle)
        {
            source.mark_stored();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.map.is_empty()
    }

    /// Returns the program of resource `name` for `(render_mode, flags)`.
    ///
    /// An unknown resource or include is requested from the loader once and
    /// reported as [`ProgramStatus::Pending`]. Fresh failures are broadcast on
    /// [`Topic::Error`].
    ///
    /// # Errors
    ///
    /// The [`ShaderError`] of the variant, cached until the resource or one
    /// of its dependencies changes.
    pub fn program(
        &mut self,
        name: &str,
        render_mode: &str,
        flags: u32,
        compiler: &mut dyn ShaderCompiler,
    ) -> std::result::Result<ProgramStatus, ShaderError> {
        let Some((handle, source)) = self.storage.entry(name) else {
            self.request_load(name);
            return Ok(ProgramStatus::Pending {
                dependency: name.to_string(),
            });
        };

        let key = ShaderSource::variant_key(&self.settings, render_mode, flags);
        if let Some(cached) = source.cached(key) {
            return cached;
        }

        let ctx = BuildContext {
            sources: &self.storage,
            snippets: &self.snippets,
            settings: &self.settings,
        };
        let build = source.build(ctx, key);

        let Some(source) = self.storage.map.get_mut(handle) else {
            return Ok(ProgramStatus::Unavailable);
        };
        let result = source.finish(key, build, compiler);

        match &result {
            Ok(ProgramStatus::Pending { dependency }) => {
                let dependency = dependency.clone();
                self.request_load(&dependency);
            }
            Err(error) => self.events.broadcast(&ShaderEvent::ProgramFailed {
                name: name.to_string(),
                key,
                error: error.clone(),
            }),
            Ok(_) => {}
        }

        result
    }

    fn source_changed(&mut self, handle: ShaderHandle, name: &str) {
        if let Some(source) = self.storage.map.get(handle) {
            self.events.broadcast(&ShaderEvent::Modified {
                name: name.to_string(),
                fingerprint: source.fingerprint(),
            });
        }
        self.run_init_script(handle);
        self.invalidate_dependents(&Dependency::Resource(name.to_string()));
    }

    fn run_init_script(&mut self, handle: ShaderHandle) {
        let Some(host) = self.script_host.as_mut() else {
            return;
        };
        let Some(source) = self.storage.map.get(handle) else {
            return;
        };
        let (Some(name), Some(code)) = (source.name(), source.init_code()) else {
            return;
        };

        if let Err(error) = host.prepare(name, code) {
            log::error!("Init script of {name} failed: {error}");
            self.events.broadcast(&ShaderEvent::ScriptFailed {
                name: name.to_string(),
                error,
            });
        }
    }

    fn invalidate_dependents(&mut self, dependency: &Dependency) {
        let mut invalidated = Vec::new();
        for source in self.storage.map.values_mut() {
            if source.depends_on(dependency) {
                source.invalidate_programs();
                invalidated.push(source.name().unwrap_or_default().to_string());
            }
        }

        for name in invalidated {
            log::debug!("{name} invalidated by {}", dependency.name());
            self.events.broadcast(&ShaderEvent::Invalidated {
                name,
                dependency: dependency.name().to_string(),
            });
        }
    }

    fn request_load(&mut self, name: &str) {
        if self.requested.insert(name.to_string()) {
            log::debug!("Requesting load of {name}");
            self.loader.request_load(name);
        }
    }
}
