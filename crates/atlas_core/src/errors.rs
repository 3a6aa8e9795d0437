//! Error Types
//!
//! This module defines the error types shared by every atlas crate.
//!
//! # Overview
//!
//! Two layers are distinguished:
//!
//! - [`ShaderError`] is the outcome of building one program variant. It is
//!   `Clone` because failures are cached per variant and broadcast to every
//!   consumer of the resource.
//! - [`AtlasError`] covers library-level failures (settings decoding, unknown
//!   resources) and wraps [`ShaderError`].
//!
//! Malformed source text is never an error: the parsers skip what they cannot
//! read. A dependency that is still loading is not an error either, it is the
//! `Pending` program state.
//!
//! ```rust,ignore
//! use atlas_core::errors::{AtlasError, Result};
//!
//! fn load_settings(json: &str) -> Result<LibrarySettings> {
//!     LibrarySettings::from_json(json)
//! }
//! ```

use thiserror::Error;

/// Diagnostic returned by the external shader compiler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileError {
    /// Compiler diagnostic text.
    pub message: String,
    /// Source line reported by the compiler, when it could tell.
    pub line: Option<u32>,
}

impl CompileError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn at_line(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

/// Diagnostic returned by the embedding host when it rejects an init script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ScriptError {
    pub message: String,
    pub line: Option<u32>,
}

impl ScriptError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }
}

/// A referenced include or snippet that can never be satisfied as written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MissingDependency {
    /// The resource is loaded but has no section with the requested name.
    #[error("section '{subfile}' not found in '{resource}'")]
    Subfile { resource: String, subfile: String },

    /// No snippet with this name is registered.
    #[error("snippet '{0}' is not registered")]
    Snippet(String),

    /// The include chain came back to a section already being assembled.
    #[error("include cycle through '{resource}:{subfile}'")]
    Cycle { resource: String, subfile: String },
}

/// Failure to produce a program for one variant.
///
/// Both kinds are permanent until the source or one of its dependencies
/// changes; neither is retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    #[error("Dependency not found: {0}")]
    DependencyNotFound(#[from] MissingDependency),

    #[error("Shader compilation failed: {0}")]
    CompileFailure(#[from] CompileError),
}

/// The main error type for the atlas crates.
#[derive(Error, Debug)]
pub enum AtlasError {
    // ========================================================================
    // Program Errors
    // ========================================================================
    #[error(transparent)]
    Shader(#[from] ShaderError),

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// No shader source with this name is registered.
    #[error("Shader source not found: {0}")]
    SourceNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings JSON could not be decoded.
    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Alias for `Result<T, AtlasError>`.
pub type Result<T> = std::result::Result<T, AtlasError>;
