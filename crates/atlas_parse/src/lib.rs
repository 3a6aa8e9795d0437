//! # Atlas Parse
//!
//! Text-level parsing of shader atlas documents. Everything here is a pure
//! function of its input and never fails: malformed lines are skipped.
//!
//! - [`atlas`]: split a document into named sections
//! - [`comments`]: strip `//` and `/* */` comments
//! - [`directive`]: literal/directive block sequences for one GLSL section
//! - [`uniforms`]: the reserved `uniforms` section

pub mod atlas;
pub mod comments;
pub mod directive;
pub mod uniforms;

pub use atlas::{SECTION_MARKER, Section, sections, split};
pub use comments::strip_comments;
pub use directive::{
    Block, DIRECTIVE_MARKER, Directive, DirectiveKind, IncludeRef, ParsedShader, parse,
};
pub use uniforms::{
    UniformDecl, UniformOptions, UniformValue, parse_uniform_block, parse_uniform_line,
};
