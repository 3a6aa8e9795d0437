//! Shader Source Resource
//!
//! A [`ShaderSource`] owns the raw atlas text and everything derived from it.
//! Assigning new text re-derives all of it at once:
//!
//! - `subfiles`: section name → body
//! - `variants`: render mode → the `.vs` / `.fs` sections defining it
//! - `global_uniforms`: the parsed `uniforms` section
//! - `init_code`: the comment-stripped `js` section, if any
//! - the program cache, which is emptied
//!
//! Programs are built lazily by [`ShaderSource::get_program`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut source = ShaderSource::with_code("\\default.vs\n...\n\\default.fs\n...");
//! match source.get_program(ctx, "default", 0, &mut compiler)? {
//!     ProgramStatus::Ready(program) => use_program(program),
//!     ProgramStatus::Pending { dependency } => wait_for(dependency),
//!     ProgramStatus::Unavailable => {}
//! }
//! ```

use atlas_core::{
    LibrarySettings, MissingDependency, ProgramStatus, ShaderError, VariantKey, VariantState,
};
use atlas_parse::{ParsedShader, UniformDecl, parse_uniform_block, strip_comments};
use rustc_hash::{FxHashMap, FxHashSet};
use xxhash_rust::xxh3::xxh3_64;

use crate::assembler::{self, Assembled};
use crate::backend::ShaderCompiler;
use crate::builtin;
use crate::cache::ProgramCache;
use crate::resolver::{BuildContext, Dependency, IncludeResolver};

pub const UNIFORMS_SECTION: &str = "uniforms";
pub const SCRIPT_SECTION: &str = "js";
const VERTEX_SUFFIX: &str = ".vs";
const FRAGMENT_SUFFIX: &str = ".fs";

/// Sections defining the two stages of one render mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedVariant {
    /// Name of the `<mode>.vs` section.
    pub vertex: Option<String>,
    /// Name of the `<mode>.fs` section.
    pub fragment: Option<String>,
}

/// Source text of both stages, ready for the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Assembly {
    Ready { vertex: String, fragment: String },
    Pending { dependency: String },
    Unavailable,
}

/// Read-only half of a program build: assembly plus what it touched.
#[derive(Debug)]
pub(crate) struct Build {
    pub assembly: Result<Assembly, MissingDependency>,
    pub dependencies: FxHashSet<Dependency>,
}

#[derive(Debug, Default)]
pub struct ShaderSource {
    name: Option<String>,
    code: String,
    subfiles: FxHashMap<String, String>,
    parsed: FxHashMap<String, ParsedShader>,
    variants: FxHashMap<String, ParsedVariant>,
    global_uniforms: FxHashMap<String, UniformDecl>,
    init_code: Option<String>,
    programs: ProgramCache,
    revision: u64,
    modified: bool,
}

impl ShaderSource {
    /// An empty, unnamed resource.
    #[must_use]
    pub fn new() -> Self {
        Self::with_code("")
    }

    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        let mut source = Self {
            code: code.into(),
            ..Self::default()
        };
        source.reparse();
        source
    }

    /// A resource registered under `name`, as delivered by a loader.
    #[must_use]
    pub fn named(name: impl Into<String>, code: impl Into<String>) -> Self {
        let mut source = Self::with_code(code);
        source.name = Some(name.into());
        source
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Replaces the text as an edit and marks the resource modified.
    ///
    /// Returns `false` (and does nothing) when the text is unchanged.
    pub fn set_code(&mut self, code: impl Into<String>) -> bool {
        let changed = self.load_code(code);
        self.modified |= changed;
        changed
    }

    /// Replaces the text with data coming from storage. The modified flag is
    /// left alone.
    pub fn load_code(&mut self, code: impl Into<String>) -> bool {
        let code = code.into();
        if code == self.code {
            return false;
        }
        self.code = code;
        self.reparse();
        true
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clears the modified flag once the text has been persisted.
    pub fn mark_stored(&mut self) {
        self.modified = false;
    }

    /// Incremented on every reparse.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.revision
    }

    /// xxh3-64 of the raw text.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        xxh3_64(self.code.as_bytes())
    }

    #[must_use]
    pub fn subfiles(&self) -> &FxHashMap<String, String> {
        &self.subfiles
    }

    #[must_use]
    pub fn subfile(&self, name: &str) -> Option<&str> {
        self.subfiles.get(name).map(String::as_str)
    }

    /// Parsed GLSL section, `""` being the unnamed one.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&ParsedShader> {
        self.parsed.get(name)
    }

    #[must_use]
    pub fn variant(&self, render_mode: &str) -> Option<&ParsedVariant> {
        self.variants.get(render_mode)
    }

    pub fn variants(&self) -> impl Iterator<Item = (&str, &ParsedVariant)> {
        self.variants.iter().map(|(mode, v)| (mode.as_str(), v))
    }

    #[must_use]
    pub fn global_uniforms(&self) -> &FxHashMap<String, UniformDecl> {
        &self.global_uniforms
    }

    #[must_use]
    pub fn init_code(&self) -> Option<&str> {
        self.init_code.as_deref()
    }

    #[must_use]
    pub fn programs(&self) -> &ProgramCache {
        &self.programs
    }

    #[must_use]
    pub fn variant_state(&self, key: VariantKey) -> VariantState {
        self.programs.state(key)
    }

    /// Drops every cached program. Used when a dependency changed.
    pub fn invalidate_programs(&mut self) {
        self.programs.clear();
    }

    #[must_use]
    pub fn depends_on(&self, dependency: &Dependency) -> bool {
        self.programs.depends_on(dependency)
    }

    fn reparse(&mut self) {
        self.subfiles = atlas_parse::split(&self.code);
        self.parsed.clear();
        self.variants.clear();
        self.global_uniforms.clear();
        self.init_code = None;

        for (name, text) in &self.subfiles {
            match name.as_str() {
                SCRIPT_SECTION => {
                    let script = strip_comments(text);
                    self.init_code = Some(script).filter(|s| !s.trim().is_empty());
                }
                UNIFORMS_SECTION => self.global_uniforms = parse_uniform_block(text),
                _ => {
                    self.parsed.insert(name.clone(), atlas_parse::parse(text));
                    if let Some(mode) = name.strip_suffix(VERTEX_SUFFIX) {
                        self.variants.entry(mode.to_string()).or_default().vertex =
                            Some(name.clone());
                    } else if let Some(mode) = name.strip_suffix(FRAGMENT_SUFFIX) {
                        self.variants.entry(mode.to_string()).or_default().fragment =
                            Some(name.clone());
                    }
                }
            }
        }

        self.programs.clear();
        self.revision = self.revision.wrapping_add(1);

        log::debug!(
            "Reparsed shader source {} (v{}): {} sections, {} variants, {} uniforms",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.revision,
            self.subfiles.len(),
            self.variants.len(),
            self.global_uniforms.len(),
        );
    }

    /// Cache key for a request, mapping the empty mode to the default one.
    #[must_use]
    pub fn variant_key(settings: &LibrarySettings, render_mode: &str, flags: u32) -> VariantKey {
        VariantKey::new(settings.resolve_render_mode(render_mode), flags)
    }

    pub(crate) fn cached(&self, key: VariantKey) -> Option<Result<ProgramStatus, ShaderError>> {
        self.programs
            .get(key)
            .map(|outcome| outcome.clone().map(ProgramStatus::Ready))
    }

    /// Returns the program for `(render_mode, flags)`, building it on a cache
    /// miss.
    ///
    /// # Errors
    ///
    /// A missing include section or snippet, an include cycle, or a compiler
    /// rejection. Errors are cached and returned again until the text changes.
    pub fn get_program(
        &mut self,
        ctx: BuildContext<'_>,
        render_mode: &str,
        flags: u32,
        compiler: &mut dyn ShaderCompiler,
    ) -> Result<ProgramStatus, ShaderError> {
        let key = Self::variant_key(ctx.settings, render_mode, flags);
        if let Some(cached) = self.cached(key) {
            return cached;
        }

        let build = self.build(ctx, key);
        self.finish(key, build, compiler)
    }

    /// Assembles both stages of `key` without touching the cache.
    pub(crate) fn build(&self, ctx: BuildContext<'_>, key: VariantKey) -> Build {
        let mut resolver = IncludeResolver::new(ctx);
        let assembly = self.assemble_variant(&mut resolver, key);

        if ctx.settings.dump_sources
            && let Ok(Assembly::Ready { vertex, fragment }) = &assembly
        {
            log::trace!(
                "================= {} [{key}] vertex ==================\n{}",
                self.name.as_deref().unwrap_or("<unnamed>"),
                assembler::collapse_blank_lines(vertex)
            );
            log::trace!(
                "================= {} [{key}] fragment ==================\n{}",
                self.name.as_deref().unwrap_or("<unnamed>"),
                assembler::collapse_blank_lines(fragment)
            );
        }

        Build {
            assembly,
            dependencies: resolver.into_dependencies(),
        }
    }

    /// Compiles a finished assembly and caches the outcome. Pending and
    /// unavailable results are not cached.
    pub(crate) fn finish(
        &mut self,
        key: VariantKey,
        build: Build,
        compiler: &mut dyn ShaderCompiler,
    ) -> Result<ProgramStatus, ShaderError> {
        self.programs.record_dependencies(build.dependencies);

        let outcome = match build.assembly {
            Ok(Assembly::Unavailable) => return Ok(ProgramStatus::Unavailable),
            Ok(Assembly::Pending { dependency }) => {
                log::debug!("Variant {key} is waiting for {dependency}");
                return Ok(ProgramStatus::Pending { dependency });
            }
            Ok(Assembly::Ready { vertex, fragment }) => compiler
                .compile(&vertex, &fragment)
                .map_err(ShaderError::from),
            Err(missing) => Err(ShaderError::from(missing)),
        };

        match &outcome {
            Ok(program) => log::debug!("Compiled variant {key} as program {}", program.raw()),
            Err(e) => log::error!(
                "Variant {key} of {} failed: {e}",
                self.name.as_deref().unwrap_or("<unnamed>")
            ),
        }

        self.programs.insert(key, outcome.clone());
        outcome.map(ProgramStatus::Ready)
    }

    fn assemble_variant(
        &self,
        resolver: &mut IncludeResolver<'_>,
        key: VariantKey,
    ) -> Result<Assembly, MissingDependency> {
        let mode = key.render_mode();
        let Some(variant) = self.variants.get(mode) else {
            return Ok(Assembly::Unavailable);
        };
        let Some(fragment_section) = variant.fragment.as_deref() else {
            return Ok(Assembly::Unavailable);
        };

        let vertex = match variant.vertex.as_deref() {
            Some(section) => match self.assemble_stage(resolver, section)? {
                Assembled::Source(source) => source,
                Assembled::Pending { dependency } => {
                    return Ok(Assembly::Pending { dependency });
                }
            },
            None if resolver.context().settings.is_screen_space(mode) => {
                builtin::screen_vertex_shader()
            }
            None => return Ok(Assembly::Unavailable),
        };

        let fragment = match self.assemble_stage(resolver, fragment_section)? {
            Assembled::Source(source) => source,
            Assembled::Pending { dependency } => return Ok(Assembly::Pending { dependency }),
        };

        let settings = resolver.context().settings;
        let defines: Vec<&str> = settings.defines_for(key.flags()).collect();

        Ok(Assembly::Ready {
            vertex: assembler::inject_defines(&vertex, defines.iter().copied()),
            fragment: assembler::inject_defines(&fragment, defines),
        })
    }

    fn assemble_stage(
        &self,
        resolver: &mut IncludeResolver<'_>,
        section: &str,
    ) -> Result<Assembled, MissingDependency> {
        let resource = self.name.as_deref().unwrap_or_default();
        let shader = self
            .parsed
            .get(section)
            .ok_or_else(|| MissingDependency::Subfile {
                resource: resource.to_string(),
                subfile: section.to_string(),
            })?;
        resolver.assemble_section(resource, section, shader)
    }
}

#[cfg(test)]
mod tests {
    use atlas_core::{CompileError, ProgramId};
    use atlas_parse::UniformValue;

    use super::*;
    use crate::snippets::SnippetRegistry;

    #[derive(Default)]
    struct RecordingCompiler {
        calls: Vec<(String, String)>,
        fail_with: Option<String>,
    }

    impl ShaderCompiler for RecordingCompiler {
        fn compile(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, CompileError> {
            self.calls.push((vertex.to_string(), fragment.to_string()));
            match &self.fail_with {
                Some(message) => Err(CompileError::at_line(message.clone(), 1)),
                None => Ok(ProgramId::new(self.calls.len() as u64)),
            }
        }
    }

    struct Fixture {
        sources: FxHashMap<String, ShaderSource>,
        snippets: SnippetRegistry,
        settings: LibrarySettings,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sources: FxHashMap::default(),
                snippets: SnippetRegistry::new(),
                settings: LibrarySettings::default(),
            }
        }

        fn ctx(&self) -> BuildContext<'_> {
            BuildContext {
                sources: &self.sources,
                snippets: &self.snippets,
                settings: &self.settings,
            }
        }
    }

    const BASIC: &str = "\\default.vs\nVS_BODY\n\\default.fs\nFS_BODY\n";

    #[test]
    fn test_compiles_once_and_caches() {
        let fixture = Fixture::new();
        let mut compiler = RecordingCompiler::default();
        let mut source = ShaderSource::with_code(BASIC);

        let first = source
            .get_program(fixture.ctx(), "default", 0, &mut compiler)
            .unwrap();
        let second = source
            .get_program(fixture.ctx(), "default", 0, &mut compiler)
            .unwrap();

        assert_eq!(first, ProgramStatus::Ready(ProgramId::new(1)));
        assert_eq!(second, first);
        assert_eq!(
            compiler.calls,
            vec![("VS_BODY".to_string(), "FS_BODY".to_string())]
        );
    }

    #[test]
    fn test_empty_mode_uses_default() {
        let fixture = Fixture::new();
        let mut compiler = RecordingCompiler::default();
        let mut source = ShaderSource::with_code(BASIC);

        source
            .get_program(fixture.ctx(), "", 0, &mut compiler)
            .unwrap();
        assert_eq!(
            source.variant_state(VariantKey::new("default", 0)),
            VariantState::Compiled(ProgramId::new(1))
        );
    }

    #[test]
    fn test_missing_stage_is_unavailable() {
        let fixture = Fixture::new();
        let mut compiler = RecordingCompiler::default();
        let mut source = ShaderSource::with_code("\\depth.fs\nFS\n\\shadow.vs\nVS");

        for mode in ["depth", "shadow", "unknown"] {
            let status = source
                .get_program(fixture.ctx(), mode, 0, &mut compiler)
                .unwrap();
            assert_eq!(status, ProgramStatus::Unavailable);
        }
        assert!(compiler.calls.is_empty());
    }

    #[test]
    fn test_screen_space_mode_uses_builtin_vertex() {
        let fixture = Fixture::new();
        let mut compiler = RecordingCompiler::default();
        let mut source = ShaderSource::with_code("\\fx.fs\nFX_FS");

        let status = source
            .get_program(fixture.ctx(), "fx", 0, &mut compiler)
            .unwrap();

        assert!(status.program().is_some());
        assert_eq!(compiler.calls[0].0, builtin::screen_vertex_shader());
        assert_eq!(compiler.calls[0].1, "FX_FS");
    }

    #[test]
    fn test_compile_error_is_cached() {
        let fixture = Fixture::new();
        let mut compiler = RecordingCompiler {
            fail_with: Some("syntax error".into()),
            ..Default::default()
        };
        let mut source = ShaderSource::with_code(BASIC);

        let first = source
            .get_program(fixture.ctx(), "default", 0, &mut compiler)
            .unwrap_err();
        let second = source
            .get_program(fixture.ctx(), "default", 0, &mut compiler)
            .unwrap_err();

        assert!(matches!(first, ShaderError::CompileFailure(_)));
        assert_eq!(first, second);
        assert_eq!(compiler.calls.len(), 1);
    }

    #[test]
    fn test_edit_invalidates_every_variant() {
        let fixture = Fixture::new();
        let mut compiler = RecordingCompiler::default();
        let mut source =
            ShaderSource::with_code(format!("{BASIC}\\depth.vs\nD_VS\n\\depth.fs\nD_FS"));

        for mode in ["default", "depth"] {
            source
                .get_program(fixture.ctx(), mode, 0, &mut compiler)
                .unwrap();
        }
        assert_eq!(source.programs().len(), 2);

        // only the depth stage changes
        assert!(source.set_code(format!("{BASIC}\\depth.vs\nD_VS2\n\\depth.fs\nD_FS")));

        assert!(source.programs().is_empty());
        assert_eq!(
            source.variant_state(VariantKey::new("default", 0)),
            VariantState::Unassembled
        );
    }

    #[test]
    fn test_identical_text_is_a_no_op() {
        let mut source = ShaderSource::with_code(BASIC);
        let version = source.version();

        assert!(!source.set_code(BASIC));
        assert_eq!(source.version(), version);
        assert!(!source.is_modified());
    }

    #[test]
    fn test_modified_flag() {
        let mut source = ShaderSource::new();
        assert!(source.load_code(BASIC));
        assert!(!source.is_modified());

        assert!(source.set_code("edited"));
        assert!(source.is_modified());

        source.mark_stored();
        assert!(!source.is_modified());
    }

    #[test]
    fn test_uniforms_appear_on_next_read() {
        let mut source = ShaderSource::with_code(BASIC);
        assert!(source.global_uniforms().is_empty());

        source.set_code(format!("{BASIC}\\uniforms\nu_time time float 0.0"));

        let decl = &source.global_uniforms()["u_time"];
        assert_eq!(decl.uniform_binding, "time");
        assert_eq!(decl.glsl_type, "float");
        assert_eq!(decl.default_value, Some(UniformValue::Number(0.0)));
        assert!(decl.options.is_none());
    }

    #[test]
    fn test_init_code_is_comment_stripped() {
        let source = ShaderSource::with_code("\\js\n// only a comment\n");
        assert!(source.init_code().is_none());

        let source = ShaderSource::with_code("\\js\nthis.speed = 1; // px/s");
        assert_eq!(source.init_code().map(str::trim), Some("this.speed = 1;"));
    }

    #[test]
    fn test_flag_defines_are_injected() {
        let mut fixture = Fixture::new();
        fixture.settings.flag_defines = vec!["USE_FOG".into(), "USE_SKIN".into()];
        let mut compiler = RecordingCompiler::default();
        let mut source =
            ShaderSource::with_code("\\default.vs\n#version 300 es\nVS\n\\default.fs\nFS");

        source
            .get_program(fixture.ctx(), "default", 0b10, &mut compiler)
            .unwrap();

        let (vertex, fragment) = &compiler.calls[0];
        assert_eq!(vertex, "#version 300 es\n#define USE_SKIN\nVS");
        assert_eq!(fragment, "#define USE_SKIN\nFS");
    }

    #[test]
    fn test_pending_is_not_cached() {
        let mut fixture = Fixture::new();
        let mut compiler = RecordingCompiler::default();
        let mut source = ShaderSource::named(
            "main.shader",
            "\\default.vs\nVS\n\\default.fs\n#pragma include \"lib.glsl\"\nFS",
        );

        let status = source
            .get_program(fixture.ctx(), "default", 0, &mut compiler)
            .unwrap();
        assert_eq!(
            status,
            ProgramStatus::Pending {
                dependency: "lib.glsl".into()
            }
        );
        assert!(compiler.calls.is_empty());
        assert!(source.depends_on(&Dependency::Resource("lib.glsl".into())));

        fixture
            .sources
            .insert("lib.glsl".into(), ShaderSource::named("lib.glsl", "LIB"));
        let status = source
            .get_program(fixture.ctx(), "default", 0, &mut compiler)
            .unwrap();

        assert!(status.program().is_some());
        assert_eq!(compiler.calls[0].1, "\nLIB\nFS");
    }

    #[test]
    fn test_fingerprint_follows_text() {
        let a = ShaderSource::with_code("a");
        let b = ShaderSource::with_code("b");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), ShaderSource::with_code("a").fingerprint());
    }
}
