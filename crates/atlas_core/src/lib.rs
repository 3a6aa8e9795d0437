//! # Atlas Core
//!
//! Foundational types shared by the shader atlas crates:
//!
//! - [`errors`]: [`ShaderError`] / [`AtlasError`] taxonomy
//! - [`interner`]: global string interner backing render-mode names
//! - [`variant`]: [`VariantKey`], [`ProgramId`], [`ProgramStatus`]
//! - [`events`]: the change-notification [`EventBus`]
//! - [`settings`]: [`LibrarySettings`]

pub mod errors;
pub mod events;
pub mod interner;
pub mod settings;
pub mod variant;

pub use errors::{AtlasError, CompileError, MissingDependency, Result, ScriptError, ShaderError};
pub use events::{EventBus, ShaderEvent, Topic};
pub use settings::LibrarySettings;
pub use variant::{ProgramId, ProgramStatus, VariantKey, VariantState};
