//! Collaborator interfaces.
//!
//! The atlas decides *what* source to compile and *when*; the embedding
//! application supplies these capabilities:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`ShaderCompiler`] | turns vertex + fragment source into a program |
//! | [`ResourceLoader`] | starts loading a missing shader resource (fire-and-forget) |
//! | [`ScriptHost`] | prepares a resource's `js` init script |

use atlas_core::{CompileError, ProgramId, ScriptError};

pub trait ShaderCompiler {
    fn compile(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, CompileError>;
}

/// Asynchronous loader of shader resources.
///
/// `request_load` must return immediately. When the data arrives the host
/// hands it to [`ShaderLibrary::insert`](crate::ShaderLibrary::insert).
pub trait ResourceLoader {
    fn request_load(&mut self, name: &str);
}

/// Forwards requests to whatever task owns the receiving end.
impl ResourceLoader for flume::Sender<String> {
    fn request_load(&mut self, name: &str) {
        if self.send(name.to_string()).is_err() {
            log::warn!("Resource loader channel closed, dropping request for {name}");
        }
    }
}

pub trait ScriptHost {
    fn prepare(&mut self, name: &str, code: &str) -> Result<(), ScriptError>;
}
