//! Uniform Block Parser
//!
//! Parses the reserved `uniforms` section, one declaration per line:
//!
//! ```text
//! <name> <uniform_binding> <glsl_type> [<default_value>] [{<options>}]
//! u_time    time     float  0.0
//! u_color   color    vec4   [1, 1, 1, 1]  { "widget": "color" }
//! u_speed   speed    float  1.5           { min: 0, max: 10 }
//! ```
//!
//! Lines with fewer than three tokens are skipped: the section is edited live
//! and is often half-written. Whole-line `//` comments and `/* */` runs that
//! span whole lines are ignored; text after `//` inside a declaration is kept,
//! since defaults and options may hold URLs.

use rustc_hash::FxHashMap;
use serde_json::Value;
use smallvec::SmallVec;

/// Editor/material options attached to a uniform declaration.
pub type UniformOptions = serde_json::Map<String, Value>;

/// Typed default value of a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Number(f64),
    /// Numeric array, e.g. the components of a `vec3`.
    Vector(SmallVec<[f64; 4]>),
    /// Anything that is not one of the above, kept as written.
    Text(String),
}

impl UniformValue {
    /// Reads a literal the way a JSON value would be read, falling back to
    /// raw text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Bool(b)) => Self::Bool(b),
            Ok(Value::Number(n)) => n
                .as_f64()
                .map_or_else(|| Self::Text(text.to_string()), Self::Number),
            Ok(Value::String(s)) => Self::Text(s),
            Ok(Value::Array(items)) => items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<SmallVec<[f64; 4]>>>()
                .map_or_else(|| Self::Text(text.to_string()), Self::Vector),
            _ => Self::Text(text.to_string()),
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    /// Name of the shader uniform the value is bound to.
    pub uniform_binding: String,
    pub glsl_type: String,
    pub default_value: Option<UniformValue>,
    pub options: Option<UniformOptions>,
}

fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Quotes JavaScript-style bare object keys (`{min:0}` → `{"min":0}`) and
/// turns single-quoted strings into double-quoted ones.
fn relax_object_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    let mut expect_key = false;

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push('"');
                while let Some(n) = chars.next() {
                    if n == '\\' {
                        out.push(n);
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                        continue;
                    }
                    if n == c {
                        break;
                    }
                    if n == '"' {
                        out.push('\\');
                    }
                    out.push(n);
                }
                out.push('"');
                expect_key = false;
            }
            '{' | ',' => {
                out.push(c);
                expect_key = true;
            }
            c if expect_key && (c.is_alphabetic() || c == '_' || c == '$') => {
                let mut ident = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '$' {
                        ident.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push('"');
                out.push_str(&ident);
                out.push('"');
                expect_key = false;
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                out.push(c);
                expect_key = false;
            }
        }
    }

    out
}

fn parse_options(text: &str) -> Option<UniformOptions> {
    let parsed = serde_json::from_str::<Value>(text)
        .or_else(|_| serde_json::from_str::<Value>(&relax_object_literal(text)));
    match parsed {
        Ok(Value::Object(map)) => Some(map),
        _ => {
            log::warn!("Ignoring unreadable uniform options: {text}");
            None
        }
    }
}

/// Parses one declaration line; `None` for blank or malformed lines.
#[must_use]
pub fn parse_uniform_line(line: &str) -> Option<UniformDecl> {
    let (name, rest) = next_token(line)?;
    let (uniform_binding, rest) = next_token(rest)?;
    let (glsl_type, rest) = next_token(rest)?;

    let (default_text, options) = match rest.find('{') {
        Some(idx) => (rest[..idx].trim(), parse_options(rest[idx..].trim())),
        None => (rest.trim(), None),
    };
    let default_value = (!default_text.is_empty()).then(|| UniformValue::parse(default_text));

    Some(UniformDecl {
        name: name.to_string(),
        uniform_binding: uniform_binding.to_string(),
        glsl_type: glsl_type.to_string(),
        default_value,
        options,
    })
}

/// Parses a whole `uniforms` section. A later declaration of the same name
/// replaces the earlier one.
#[must_use]
pub fn parse_uniform_block(source: &str) -> FxHashMap<String, UniformDecl> {
    let mut uniforms = FxHashMap::default();
    let mut in_block_comment = false;
    for line in source.lines() {
        let line = line.trim();
        if in_block_comment {
            in_block_comment = !line.ends_with("*/");
            continue;
        }
        if line.starts_with("/*") {
            in_block_comment = !(line.len() >= 4 && line.ends_with("*/"));
            continue;
        }
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        match parse_uniform_line(line) {
            Some(decl) => {
                uniforms.insert(decl.name.clone(), decl);
            }
            None => log::warn!("Skipping malformed uniform declaration: {line}"),
        }
    }
    uniforms
}
