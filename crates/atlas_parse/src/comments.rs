//! C-style comment removal.
//!
//! `/* ... */` and `// ...` are removed. Newlines inside block comments are
//! kept so line numbers in compiler diagnostics stay close to the source.

/// Removes block and line comments from GLSL-like source.
///
/// An unterminated block comment swallows the rest of the input.
#[must_use]
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '/' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('/') => {
                // line comment: drop up to (not including) the newline
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            Some('*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    if n == '\n' {
                        out.push('\n');
                    }
                    prev = n;
                }
            }
            _ => out.push(c),
        }
    }

    out
}
