//! Integration tests for the converter against the fixture distribution.

use regex::Regex;
use rstest::rstest;
use std::path::PathBuf;
use twcss::tailwind::{ConvertError, Converter, DirDist, Minify};

fn fixture_dist() -> DirDist {
    DirDist::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dist"))
}

/// Convert named inputs in the given order
fn convert(inputs: &[(&str, &str)]) -> Result<String, ConvertError> {
    let mut out = Vec::new();
    let mut converter = Converter::new(&mut out, fixture_dist());
    for (name, css) in inputs {
        converter.add_reader(*name, css.as_bytes(), !name.ends_with(".css"));
    }
    converter.run()?;
    Ok(String::from_utf8(out).expect("output is utf8"))
}

#[rstest]
#[case::simple(&[("001.css", ".test1 { display: block; }")], ".test1{display:block;}")]
#[case::two_files(
    &[("001.css", ".test1 { display: block; }"), ("002.css", ".test2 { display: inline; }")],
    ".test1{display:block;}.test2{display:inline;}"
)]
#[case::order_is_insertion_order(
    &[("021.css", ".test1 { display: block; }"), ("012.css", ".test2 { display: inline; }")],
    ".test1{display:block;}.test2{display:inline;}"
)]
#[case::charset(
    &[("001.css", r#"@charset "utf-8"; .test1 { display: block; }"#)],
    r#"@charset "utf-8";.test1{display:block;}"#
)]
#[case::apply_one(
    &[("001.css", ".test { @apply px-1; }")],
    ".test{padding-left:0.25rem;padding-right:0.25rem;}"
)]
#[case::apply_two(
    &[("001.css", ".test { @apply px-1 py-2; }")],
    ".test{padding-left:0.25rem;padding-right:0.25rem;padding-top:0.5rem;padding-bottom:0.5rem;}"
)]
#[case::inline_style(&[("style-attr", "color: red; @apply font-bold")], "color:red;font-weight:700;")]
#[case::media_passthrough(
    &[("001.css", "@media print { .a { b: c } }")],
    "@media print{.a{b:c;}}"
)]
fn test_exact_output(#[case] inputs: &[(&str, &str)], #[case] expected: &str) {
    assert_eq!(convert(inputs).unwrap(), expected);
}

#[rstest]
#[case::base("@tailwind base;", &[r"html\{line-height:1\.15;", r"b,strong\{"])]
#[case::components("@tailwind components;", &[r"\.container\{width:100%"])]
#[case::utilities("@tailwind utilities;", &[r"var\(--bg-opacity\)", r"--bg-opacity: 1"])]
#[case::escapes_survive("@tailwind utilities;", &[r"\.md\\:bg-purple-500\{", r"\.w-1\\/2\{"])]
fn test_tailwind_sections(#[case] input: &str, #[case] patterns: &[&str]) {
    let out = convert(&[("001.css", input)]).unwrap();
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(&out), "{pattern:?} not found in {out}");
    }
}

#[test]
fn test_selector_groups_render_without_doubled_commas() {
    let out = convert(&[("001.css", "@tailwind base;")]).unwrap();
    assert!(out.contains("h1,h2,h3{font-size:inherit;font-weight:inherit;}"));
    assert!(out.contains(r#"button,[type="button"]{"#));
    assert!(!out.contains(",,"));
}

#[test]
fn test_base_section_snapshot() {
    let out = convert(&[("001.css", "@tailwind base;")]).unwrap();
    insta::assert_snapshot!(out, @r#"html{line-height:1.15;-webkit-text-size-adjust:100%;}body{margin:0;}b,strong{font-weight:bolder;}h1,h2,h3{font-size:inherit;font-weight:inherit;}button,[type="button"]{-webkit-appearance:button;}"#);
}

#[test]
fn test_components_section_snapshot() {
    let out = convert(&[("001.css", "@tailwind components;")]).unwrap();
    insta::assert_snapshot!(out, @".container{width:100%;}@media (min-width: 640px){.container{max-width:640px;}}@media (min-width: 768px){.container{max-width:768px;}}");
}

#[rstest]
#[case::bad_declaration(".test1 { display: block; ! }", r"^001\.css: expected colon in declaration on line 1 and column \d+$")]
#[case::unknown_section("@tailwind otherthing;", r"@tailwind followed by unknown identifier: otherthing")]
#[case::tailwind_arity("@tailwind base utilities;", r"exactly one token")]
#[case::unknown_apply(".test { @apply nonexistent; }", r"^001\.css: unknown @apply name: nonexistent$")]
#[case::apply_non_ident(".test { @apply #fff; }", r"unexpected token while looking for ident: Hash")]
fn test_errors(#[case] input: &str, #[case] pattern: &str) {
    let err = convert(&[("001.css", input)]).unwrap_err();
    assert!(!err.is_internal());
    let re = Regex::new(pattern).unwrap();
    assert!(re.is_match(&err.to_string()), "{pattern:?} did not match {err}");
}

#[test]
fn test_error_in_second_input_names_it() {
    let err = convert(&[("001.css", ".a { b: c }"), ("002.css", ".a { ! }")]).unwrap_err();
    assert_eq!(err.source_name(), Some("002.css"));
}

#[test]
fn test_minified_apply() {
    let mut out = Vec::new();
    let mut converter = Converter::new(&mut out, fixture_dist());
    converter
        .add_reader("input.css", ".test1 { @apply font-bold; }".as_bytes(), false)
        .set_post_processor(Minify);
    converter.run().unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), ".test1{font-weight:700}");
}

#[test]
fn test_missing_dist_dir() {
    let mut out = Vec::new();
    let mut converter = Converter::new(&mut out, DirDist::new("/no/such/dist"));
    converter.add_reader("001.css", "@tailwind base;".as_bytes(), false);
    let err = converter.run().unwrap_err();
    assert!(matches!(err, ConvertError::Dist { .. }));
    assert!(err.to_string().contains("base.css"));
}
