//! Variant keys and program handles.
//!
//! A program is cached per [`VariantKey`]: the render mode (`default`,
//! `depth`, `fx`, ...) plus an integer flag mask. Two keys are equal iff both
//! components are equal.

use std::fmt;

use crate::errors::ShaderError;
use crate::interner::{self, Symbol};

/// Cache key of one compiled program variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey {
    render_mode: Symbol,
    flags: u32,
}

impl VariantKey {
    #[must_use]
    pub fn new(render_mode: &str, flags: u32) -> Self {
        Self {
            render_mode: interner::intern(render_mode),
            flags,
        }
    }

    #[inline]
    #[must_use]
    pub fn render_mode(self) -> &'static str {
        interner::resolve(self.render_mode)
    }

    #[inline]
    #[must_use]
    pub fn flags(self) -> u32 {
        self.flags
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:#x}", self.render_mode(), self.flags)
    }
}

/// Opaque handle to a program compiled by the external compiler.
///
/// The compiler mints the raw value; the atlas only stores and returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u64);

impl ProgramId {
    #[inline]
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Result of asking a resource for a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramStatus {
    /// The program is compiled (now or earlier) and cached.
    Ready(ProgramId),
    /// A referenced resource is not loaded yet. Nothing was cached; ask again
    /// once the dependency has been registered.
    Pending { dependency: String },
    /// The render mode has no usable vertex/fragment pair.
    Unavailable,
}

impl ProgramStatus {
    #[inline]
    #[must_use]
    pub fn program(&self) -> Option<ProgramId> {
        match self {
            Self::Ready(id) => Some(*id),
            _ => None,
        }
    }
}

/// Cached state of one variant, as observed from outside the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantState {
    /// Never built since the last reparse, or the last attempt was pending.
    Unassembled,
    Compiled(ProgramId),
    Failed(ShaderError),
}
