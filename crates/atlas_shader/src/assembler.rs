//! Source Assembler
//!
//! Walks a parsed block sequence and concatenates it into compilable source.
//!
//! - literal blocks are appended as they are
//! - resolved include/snippet text is wrapped in single newlines
//! - opaque directives are re-emitted on their own line
//!
//! The first pending or missing reference aborts the walk. No partial source
//! ever leaves this module.

use atlas_core::MissingDependency;
use atlas_parse::{Block, ParsedShader};

use crate::resolver::{IncludeResolver, Resolution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    Source(String),
    /// A referenced resource is still loading.
    Pending { dependency: String },
}

impl Assembled {
    #[must_use]
    pub fn into_source(self) -> Option<String> {
        match self {
            Self::Source(source) => Some(source),
            Self::Pending { .. } => None,
        }
    }
}

fn push_line(out: &mut String, text: &str) {
    out.push('\n');
    out.push_str(text);
    out.push('\n');
}

/// Assembles one parsed sub-file, resolving its references through `resolver`.
pub fn assemble(
    shader: &ParsedShader,
    resolver: &mut IncludeResolver<'_>,
) -> Result<Assembled, MissingDependency> {
    if let Some(flat) = &shader.flat {
        return Ok(Assembled::Source(flat.clone()));
    }

    let mut out = String::new();
    for block in &shader.blocks {
        match block {
            Block::Literal(text) => out.push_str(text),
            Block::Directive(directive) => match resolver.resolve(&directive.kind) {
                None => push_line(&mut out, &directive.line),
                Some(Resolution::Resolved(code)) => push_line(&mut out, &code),
                Some(Resolution::Pending(dependency)) => {
                    return Ok(Assembled::Pending { dependency });
                }
                Some(Resolution::NotFound(missing)) => return Err(missing),
            },
        }
    }

    Ok(Assembled::Source(out))
}

/// Inserts one `#define` per name, right after a leading `#version` line when
/// the source has one, otherwise at the top.
#[must_use]
pub fn inject_defines<'a>(source: &str, defines: impl IntoIterator<Item = &'a str>) -> String {
    let block: String = defines
        .into_iter()
        .map(|name| format!("#define {name}\n"))
        .collect();
    if block.is_empty() {
        return source.to_string();
    }

    let body = source.trim_start();
    if body.starts_with("#version") {
        let offset = source.len() - body.len();
        let split = body.find('\n').map_or(source.len(), |i| offset + i + 1);
        let (head, tail) = source.split_at(split);
        let separator = if head.ends_with('\n') { "" } else { "\n" };
        return format!("{head}{separator}{block}{tail}");
    }

    format!("{block}{source}")
}

/// Collapses runs of blank lines, for readable source dumps.
pub(crate) fn collapse_blank_lines(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut last_was_newline = false;
    for c in source.chars() {
        if c == '\n' {
            if !last_was_newline {
                result.push('\n');
                last_was_newline = true;
            }
        } else {
            result.push(c);
            last_was_newline = false;
        }
    }
    result
}
