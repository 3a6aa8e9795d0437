//! # Atlas Shader
//!
//! Shader source resources and the machinery that turns them into programs.
//!
//! ```text
//! atlas text ─▶ ShaderSource (split + parse)
//!                   │ get_program(mode, flags)
//!                   ▼
//!             IncludeResolver ─▶ SourceAssembler ─▶ ShaderCompiler
//!                                                        │
//!                                             ProgramCache ◀┘
//! ```
//!
//! - [`source`]: the [`ShaderSource`] resource and its per-variant builds
//! - [`resolver`]: include and snippet resolution, with cycle detection
//! - [`assembler`]: block concatenation and flag defines
//! - [`cache`]: the per-resource [`ProgramCache`]
//! - [`library`]: [`ShaderLibrary`], the registry and build context
//! - [`backend`]: compiler, loader and script host interfaces

pub mod assembler;
pub mod backend;
pub mod builtin;
pub mod cache;
pub mod library;
pub mod resolver;
pub mod snippets;
pub mod source;

pub use assembler::{Assembled, inject_defines};
pub use backend::{ResourceLoader, ScriptHost, ShaderCompiler};
pub use cache::ProgramCache;
pub use library::{ShaderHandle, ShaderLibrary, SourceStorage};
pub use resolver::{BuildContext, Dependency, IncludeResolver, Resolution, SourceLookup};
pub use snippets::{SnippetRegistry, SourceFragment};
pub use source::{ParsedVariant, ShaderSource};
