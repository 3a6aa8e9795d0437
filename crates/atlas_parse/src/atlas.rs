//! Atlas Splitter
//!
//! An atlas is a single text document holding several named sub-files:
//!
//! ```text
//! free-form text before the first header belongs to the unnamed section
//! \default.vs
//! void main() { ... }
//! \default.fs
//! void main() { ... }
//! ```
//!
//! A header is a line whose first non-blank character is [`SECTION_MARKER`];
//! the rest of the line (trimmed) is the section name. A repeated name
//! replaces the earlier body.

use rustc_hash::FxHashMap;

pub const SECTION_MARKER: char = '\\';

/// One section of an atlas, borrowed from the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub name: &'a str,
    /// Body lines, without the header line.
    pub lines: Vec<&'a str>,
}

impl Section<'_> {
    /// Body text: the lines joined with `\n`, no trailing newline.
    #[must_use]
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

fn header_name(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(SECTION_MARKER)
        .map(str::trim)
}

/// Sections in document order, duplicates included.
///
/// The implicit unnamed section is always yielded first, even when empty.
#[must_use]
pub fn sections(raw: &str) -> Vec<Section<'_>> {
    let mut sections = vec![Section {
        name: "",
        lines: Vec::new(),
    }];

    for line in raw.lines() {
        if let Some(name) = header_name(line) {
            sections.push(Section {
                name,
                lines: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line);
        }
    }

    sections
}

/// Splits an atlas into section name → body text. Last occurrence of a name
/// wins.
#[must_use]
pub fn split(raw: &str) -> FxHashMap<String, String> {
    sections(raw)
        .into_iter()
        .map(|section| (section.name.to_string(), section.body()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let files = split("");
        assert_eq!(files.len(), 1);
        assert_eq!(files[""], "");
    }

    #[test]
    fn test_document_without_headers_is_unnamed_section() {
        let files = split("line one\nline two\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[""], "line one\nline two");
    }

    #[test]
    fn test_named_sections() {
        let files = split("meta\n\\default.vs\nVS_BODY\n\\default.fs\nFS_BODY\n");
        assert_eq!(files[""], "meta");
        assert_eq!(files["default.vs"], "VS_BODY");
        assert_eq!(files["default.fs"], "FS_BODY");
    }

    #[test]
    fn test_header_may_be_indented() {
        let files = split("  \\uniforms  \nu_time time float 0.0");
        assert_eq!(files["uniforms"], "u_time time float 0.0");
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let files = split("\\a.fs\nfirst\n\\b.fs\nother\n\\a.fs\nsecond");
        assert_eq!(files["a.fs"], "second");
        assert_eq!(files["b.fs"], "other");
    }

    #[test]
    fn test_bodies_are_kept_verbatim() {
        let raw = "\\x\n  indented\n\n\ttabbed  \n\\y\n";
        let files = split(raw);
        assert_eq!(files["x"], "  indented\n\n\ttabbed  ");
        assert_eq!(files["y"], "");
    }

    #[test]
    fn test_sections_preserve_order_and_duplicates() {
        let names: Vec<_> = sections("\\b\n\\a\n\\b\n")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["", "b", "a", "b"]);
    }
}
