#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Shader Atlas
//!
//! Multi-section shader source documents ("atlases") compiled into
//! per-variant GPU programs.
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`atlas_core`] | errors, variant keys, events, settings |
//! | [`atlas_parse`] | splitter, directive and uniform parsers |
//! | [`atlas_shader`] | resources, resolver, assembler, library |
//!
//! The most used types are re-exported at the root.

pub use atlas_core;
pub use atlas_parse;
pub use atlas_shader;

pub use atlas_core::{
    AtlasError, CompileError, EventBus, LibrarySettings, MissingDependency, ProgramId,
    ProgramStatus, Result, ScriptError, ShaderError, ShaderEvent, Topic, VariantKey, VariantState,
};
pub use atlas_parse::{UniformDecl, UniformValue};
pub use atlas_shader::{
    BuildContext, Dependency, ResourceLoader, ScriptHost, ShaderCompiler, ShaderHandle,
    ShaderLibrary, ShaderSource, SnippetRegistry,
};
