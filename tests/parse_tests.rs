//! Atlas Parsing Tests
//!
//! Tests for:
//! - split: section bodies, last-wins duplicates, the implicit unnamed section
//! - parse: idempotence, comment stripping before directive detection
//! - parse_uniform_block: typed defaults, options, skipped malformed lines

use shader_atlas::atlas_parse::{
    Block, DirectiveKind, IncludeRef, UniformValue, parse, parse_uniform_block, sections, split,
};

const COLOR: &str = include_str!("fixtures/color.shader");

// ============================================================================
// Splitter Tests
// ============================================================================

#[test]
fn split_keeps_section_bodies_verbatim() {
    let doc = "meta\n\\a.vs\nline 1\n  line 2\n\\a.fs\n\nbody\n";
    let parts = split(doc);

    assert_eq!(parts[""], "meta");
    assert_eq!(parts["a.vs"], "line 1\n  line 2");
    assert_eq!(parts["a.fs"], "\nbody");
}

#[test]
fn split_rejoined_sections_reproduce_bodies() {
    let all = sections(COLOR);
    let rejoined: Vec<String> = all
        .iter()
        .map(|section| {
            if section.name.is_empty() {
                section.body()
            } else {
                format!("\\{}\n{}", section.name, section.body())
            }
        })
        .collect();

    assert_eq!(rejoined.join("\n"), COLOR.trim_end_matches('\n'));
}

#[test]
fn split_duplicate_name_last_wins() {
    let parts = split("\\x\nfirst\n\\x\nsecond");
    assert_eq!(parts["x"], "second");
    assert_eq!(parts.len(), 2);
}

#[test]
fn split_empty_document() {
    let parts = split("");
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[""], "");
}

// ============================================================================
// Directive Parser Tests
// ============================================================================

#[test]
fn parse_is_idempotent() {
    let text = split(COLOR)["default.fs"].clone();
    assert_eq!(parse(&text), parse(&text));
}

#[test]
fn parse_records_declared_uniforms() {
    let parsed = parse(&split(COLOR)["default.fs"]);
    assert_eq!(parsed.declared_uniforms["u_time"], "float");
    assert_eq!(parsed.declared_uniforms["u_material_color"], "vec4");
    assert!(parsed.is_dynamic);
}

#[test]
fn parse_ignores_directives_inside_comments() {
    let text = "void a();\n// #pragma include \"lib.glsl\"\n/* #pragma snippet fog */\n/*\n#pragma snippet fog\n*/\nvoid b();";
    let parsed = parse(text);

    assert!(!parsed.is_dynamic);
    assert_eq!(parsed.references().count(), 0);
    assert_eq!(parsed.blocks.len(), 1);
}

#[test]
fn parse_keeps_block_order() {
    let parsed = parse("one\n#pragma snippet a\ntwo\n#pragma include \"b.glsl:c\"\nthree");
    let shape: Vec<&str> = parsed
        .blocks
        .iter()
        .map(|block| match block {
            Block::Literal(text) => text.as_str(),
            Block::Directive(directive) => directive.action.as_str(),
        })
        .collect();

    assert_eq!(shape, ["one", "snippet", "two", "include", "three"]);
    assert_eq!(
        parsed.references().nth(1),
        Some(&DirectiveKind::Include(IncludeRef {
            filename: "b.glsl".into(),
            subfile: Some("c".into()),
        }))
    );
}

// ============================================================================
// Uniform Block Tests
// ============================================================================

#[test]
fn uniform_block_from_fixture() {
    let uniforms = parse_uniform_block(&split(COLOR)["uniforms"]);

    // `u_broken` has a single token and is skipped
    assert_eq!(uniforms.len(), 2);

    let time = &uniforms["u_time"];
    assert_eq!(time.uniform_binding, "time");
    assert_eq!(time.glsl_type, "float");
    assert_eq!(time.default_value, Some(UniformValue::Number(0.0)));
    assert!(time.options.is_none());

    let color = &uniforms["u_material_color"];
    assert!(matches!(&color.default_value, Some(UniformValue::Vector(v)) if v.len() == 4));
    assert_eq!(color.options.as_ref().unwrap()["widget"], "color");
}

#[test]
fn uniform_block_last_declaration_wins() {
    let uniforms = parse_uniform_block("u_a a float 1.0\n// u_a a float 3.0\nu_a a float 2.0");
    assert_eq!(uniforms["u_a"].default_value, Some(UniformValue::Number(2.0)));
}
