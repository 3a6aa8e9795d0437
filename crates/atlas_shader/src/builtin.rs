//! Built-in GLSL sources embedded in the binary.
//!
//! - `screen_vertex.glsl`: vertex stage used by screen-space modes that only
//!   provide a fragment stage
//! - `snippets/*.glsl`: reusable fragments, registered under their file stem

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "src/builtin"]
struct BuiltinShaders;

const SCREEN_VERTEX: &str = "screen_vertex.glsl";
const SNIPPET_DIR: &str = "snippets/";

fn embedded_text(path: &str) -> Option<String> {
    let file = BuiltinShaders::get(path)?;
    match std::str::from_utf8(file.data.as_ref()) {
        Ok(source) => Some(source.to_string()),
        Err(e) => {
            log::error!("Built-in shader {path} is not UTF-8: {e}");
            None
        }
    }
}

/// Full-screen quad vertex stage: passes `a_coord` through as `v_coord`.
#[must_use]
pub fn screen_vertex_shader() -> String {
    embedded_text(SCREEN_VERTEX).unwrap_or_default()
}

/// `(name, code)` of every embedded snippet.
pub fn snippets() -> impl Iterator<Item = (String, String)> {
    BuiltinShaders::iter().filter_map(|path| {
        let name = path.strip_prefix(SNIPPET_DIR)?.strip_suffix(".glsl")?;
        Some((name.to_string(), embedded_text(&path)?))
    })
}
