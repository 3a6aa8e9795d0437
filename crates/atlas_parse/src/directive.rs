//! Directive Parser
//!
//! Splits one GLSL sub-file into a sequence of [`Block`]s: runs of literal code
//! interleaved with directive lines. Comments are stripped first, so a marker
//! inside a comment is never seen as a directive.
//!
//! # Recognized directives
//!
//! | Line | Kind |
//! |------|------|
//! | `#pragma include "file.ext"` | section `""` of another resource |
//! | `#pragma include "file.ext:section"` | named section of another resource |
//! | `#pragma include "name"` | snippet (no extension) |
//! | `#pragma snippet name` | snippet |
//! | any other `#...` line | opaque, emitted verbatim |
//!
//! A sub-file with no `#pragma` line is *static*: its whole stripped text is
//! kept in [`ParsedShader::flat`] and needs no per-variant reassembly.

use rustc_hash::FxHashMap;

use crate::comments::strip_comments;

pub const DIRECTIVE_MARKER: char = '#';

const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Reference carried by an include directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludeRef {
    /// Resource name, or snippet name when it has no extension.
    pub filename: String,
    /// Section inside the resource; `None` means the unnamed section.
    pub subfile: Option<String>,
}

impl IncludeRef {
    /// Parses `"file"` / `"file:section"`; surrounding quotes are optional.
    #[must_use]
    pub fn parse(argument: &str) -> Option<Self> {
        let inner = argument.trim();
        let inner = inner
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(inner)
            .trim();
        if inner.is_empty() {
            return None;
        }

        let (filename, subfile) = match inner.split_once(':') {
            Some((file, sub)) => (file, Some(sub).filter(|s| !s.is_empty())),
            None => (inner, None),
        };
        if filename.is_empty() {
            return None;
        }

        Some(Self {
            filename: filename.to_string(),
            subfile: subfile.map(str::to_string),
        })
    }

    /// Whether the reference names a snippet rather than a resource.
    #[must_use]
    pub fn is_snippet(&self) -> bool {
        std::path::Path::new(&self.filename).extension().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Include(IncludeRef),
    Snippet(String),
    /// Unrecognized directive, passed to the compiler unchanged.
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The trimmed source line.
    pub line: String,
    pub action: String,
    pub argument: String,
    pub kind: DirectiveKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Literal(String),
    Directive(Directive),
}

/// Parsed form of one sub-file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedShader {
    pub blocks: Vec<Block>,
    /// Uniform name → GLSL type, for every `uniform` declaration line.
    pub declared_uniforms: FxHashMap<String, String>,
    /// Set when the text contains at least one `#pragma` line.
    pub is_dynamic: bool,
    /// Comment-stripped text of a static sub-file.
    pub flat: Option<String>,
}

impl ParsedShader {
    /// Include and snippet references in source order.
    pub fn references(&self) -> impl Iterator<Item = &DirectiveKind> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Directive(d) if !matches!(d.kind, DirectiveKind::Opaque) => Some(&d.kind),
            _ => None,
        })
    }
}

fn parse_directive(line: &str) -> Option<(Directive, bool)> {
    let body = line.strip_prefix(DIRECTIVE_MARKER)?;
    let mut tokens = body.splitn(2, char::is_whitespace);
    let head = tokens.next().unwrap_or_default();
    let rest = tokens.next().unwrap_or_default().trim();

    if head != "pragma" {
        let directive = Directive {
            line: line.to_string(),
            action: head.to_string(),
            argument: rest.to_string(),
            kind: DirectiveKind::Opaque,
        };
        return Some((directive, false));
    }

    let mut tokens = rest.splitn(2, char::is_whitespace);
    let action = tokens.next().unwrap_or_default();
    let argument = tokens.next().unwrap_or_default().trim();

    let kind = match action {
        "include" => match IncludeRef::parse(argument) {
            Some(include) => DirectiveKind::Include(include),
            None => {
                log::warn!("Ignoring malformed include directive: {line}");
                DirectiveKind::Opaque
            }
        },
        "snippet" if !argument.is_empty() => DirectiveKind::Snippet(argument.to_string()),
        _ => DirectiveKind::Opaque,
    };

    let directive = Directive {
        line: line.to_string(),
        action: action.to_string(),
        argument: argument.to_string(),
        kind,
    };
    Some((directive, true))
}

/// Records every name declared by a `uniform` line, e.g.
/// `uniform vec4 u_a, u_b[2];`.
fn record_declared_uniforms(line: &str, declared: &mut FxHashMap<String, String>) {
    let mut words = line.split_whitespace();
    if words.next() != Some("uniform") {
        return;
    }
    let mut glsl_type = words.next();
    if glsl_type.is_some_and(|w| PRECISION_QUALIFIERS.contains(&w)) {
        glsl_type = words.next();
    }
    let Some(glsl_type) = glsl_type else {
        return;
    };

    let names: String = words.collect();
    for name in names.split([',', ';']) {
        let name = name.split('[').next().unwrap_or_default();
        if !name.is_empty() {
            declared.insert(name.to_string(), glsl_type.to_string());
        }
    }
}

/// Parses one sub-file.
#[must_use]
pub fn parse(source: &str) -> ParsedShader {
    let code = strip_comments(source);

    let mut parsed = ParsedShader::default();
    let mut current: Vec<&str> = Vec::new();

    for line in code.split('\n') {
        let trimmed = line.trim();

        if !trimmed.starts_with(DIRECTIVE_MARKER) {
            record_declared_uniforms(trimmed, &mut parsed.declared_uniforms);
            current.push(line);
            continue;
        }

        let Some((directive, is_pragma)) = parse_directive(trimmed) else {
            current.push(line);
            continue;
        };
        parsed.is_dynamic |= is_pragma;

        if !current.is_empty() {
            parsed.blocks.push(Block::Literal(current.join("\n")));
            current.clear();
        }
        parsed.blocks.push(Block::Directive(directive));
    }

    if !current.is_empty() {
        parsed.blocks.push(Block::Literal(current.join("\n")));
    }

    if !parsed.is_dynamic {
        // no directive line at all: keep exactly one literal block
        if parsed.blocks.iter().all(|b| matches!(b, Block::Literal(_))) {
            parsed.blocks = vec![Block::Literal(code.clone())];
        }
        parsed.flat = Some(code);
    }

    parsed
}
