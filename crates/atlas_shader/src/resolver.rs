//! Include / Snippet Resolver
//!
//! Turns one include or snippet directive into source text.
//!
//! - A reference **without** an extension is a snippet, looked up in the
//!   [`SnippetRegistry`], even when a resource of the same name exists.
//! - A reference **with** an extension names another [`ShaderSource`]. If it
//!   is not loaded the result is [`Resolution::Pending`]; if it is loaded but
//!   lacks the requested section the result is [`Resolution::NotFound`].
//!
//! Included sections are assembled recursively. The resolver keeps the chain
//! of `(resource, section)` pairs being assembled and reports a revisit as a
//! [`MissingDependency::Cycle`] instead of recursing forever.
//!
//! Nothing is cached here: every assembly resolves again, so a dependency
//! update shows up as soon as the dependent's program cache is cleared.

use atlas_core::{LibrarySettings, MissingDependency};
use atlas_parse::{DirectiveKind, ParsedShader};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::assembler::{self, Assembled};
use crate::snippets::SnippetRegistry;
use crate::source::ShaderSource;

/// Read access to loaded shader resources, by name.
pub trait SourceLookup {
    fn lookup(&self, name: &str) -> Option<&ShaderSource>;
}

impl SourceLookup for FxHashMap<String, ShaderSource> {
    fn lookup(&self, name: &str) -> Option<&ShaderSource> {
        self.get(name)
    }
}

/// Everything an assembly reads besides the resource itself.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub sources: &'a dyn SourceLookup,
    pub snippets: &'a SnippetRegistry,
    pub settings: &'a LibrarySettings,
}

/// Something an assembly looked at, whether or not it was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    Resource(String),
    Snippet(String),
}

impl Dependency {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Resource(name) | Self::Snippet(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    /// The named resource is not loaded yet.
    Pending(String),
    NotFound(MissingDependency),
}

pub struct IncludeResolver<'a> {
    ctx: BuildContext<'a>,
    visiting: Vec<(String, String)>,
    dependencies: FxHashSet<Dependency>,
}

impl<'a> IncludeResolver<'a> {
    #[must_use]
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self {
            ctx,
            visiting: Vec::new(),
            dependencies: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn context(&self) -> BuildContext<'a> {
        self.ctx
    }

    /// Assembles `shader` as section `subfile` of `resource`, tracking it on
    /// the in-progress chain.
    pub fn assemble_section(
        &mut self,
        resource: &str,
        subfile: &str,
        shader: &ParsedShader,
    ) -> Result<Assembled, MissingDependency> {
        let entry = (resource.to_string(), subfile.to_string());
        if self.visiting.contains(&entry) {
            return Err(MissingDependency::Cycle {
                resource: entry.0,
                subfile: entry.1,
            });
        }

        self.visiting.push(entry);
        let result = assembler::assemble(shader, self);
        self.visiting.pop();
        result
    }

    /// Resolves a directive. `None` for opaque directives, which are emitted
    /// verbatim.
    pub fn resolve(&mut self, kind: &DirectiveKind) -> Option<Resolution> {
        match kind {
            DirectiveKind::Include(include) if include.is_snippet() => {
                Some(self.resolve_snippet(&include.filename))
            }
            DirectiveKind::Include(include) => Some(
                self.resolve_include(&include.filename, include.subfile.as_deref()),
            ),
            DirectiveKind::Snippet(name) => Some(self.resolve_snippet(name)),
            DirectiveKind::Opaque => None,
        }
    }

    pub fn resolve_snippet(&mut self, name: &str) -> Resolution {
        self.dependencies
            .insert(Dependency::Snippet(name.to_string()));

        match self.ctx.snippets.get(name) {
            Some(fragment) => Resolution::Resolved(fragment.code.clone()),
            None => {
                log::warn!("Snippet not found: {name}");
                Resolution::NotFound(MissingDependency::Snippet(name.to_string()))
            }
        }
    }

    /// Resolves section `subfile` (the unnamed section when `None`) of the
    /// resource `filename`.
    pub fn resolve_include(&mut self, filename: &str, subfile: Option<&str>) -> Resolution {
        self.dependencies
            .insert(Dependency::Resource(filename.to_string()));

        let sources = self.ctx.sources;
        let Some(source) = sources.lookup(filename) else {
            log::debug!("Include {filename} is not loaded yet");
            return Resolution::Pending(filename.to_string());
        };

        let subfile = subfile.unwrap_or_default();
        let Some(shader) = source.section(subfile) else {
            // reserved sections are not parsed as GLSL; include them as written
            if let Some(text) = source.subfile(subfile) {
                return Resolution::Resolved(text.to_string());
            }
            log::warn!("Section '{subfile}' not found in {filename}");
            return Resolution::NotFound(MissingDependency::Subfile {
                resource: filename.to_string(),
                subfile: subfile.to_string(),
            });
        };

        match self.assemble_section(filename, subfile, shader) {
            Ok(Assembled::Source(code)) => Resolution::Resolved(code),
            Ok(Assembled::Pending { dependency }) => Resolution::Pending(dependency),
            Err(missing) => Resolution::NotFound(missing),
        }
    }

    #[must_use]
    pub fn into_dependencies(self) -> FxHashSet<Dependency> {
        self.dependencies
    }
}
