use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn fixture_dist() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("twcss")
        .join("tests")
        .join("fixtures")
        .join("dist")
}

#[test]
fn convert_file_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.css");
    fs::write(&input, ".test { @apply px-1 py-2; }").unwrap();

    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("--dist")
        .arg(fixture_dist());

    cmd.assert().success().stdout(
        ".test{padding-left:0.25rem;padding-right:0.25rem;padding-top:0.5rem;padding-bottom:0.5rem;}",
    );
}

#[test]
fn convert_stdin_with_minify() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("--dist")
        .arg(fixture_dist())
        .arg("--minify")
        .write_stdin(".test1 { @apply font-bold; }");

    cmd.assert().success().stdout(".test1{font-weight:700}");
}

#[test]
fn write_output_file_and_purge() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("site");
    fs::create_dir(&site).unwrap();
    fs::write(site.join("index.html"), r#"<p class="font-bold md:px-1">hi</p>"#).unwrap();
    fs::write(dir.path().join("main.css"), "@tailwind utilities;").unwrap();
    let output = dir.path().join("out.css");

    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("main.css")
        .arg("-o")
        .arg(&output)
        .arg("--dist")
        .arg(fixture_dist())
        .arg("--purge")
        .arg(&site);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let css = fs::read_to_string(&output).unwrap();
    assert!(css.contains(".font-bold{font-weight:700;}"));
    assert!(css.contains(r".md\:px-1{"));
    assert!(!css.contains(".px-1{"));
    assert!(!css.contains(".bg-purple-500{"));
}

#[test]
fn config_file_supplies_dist() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("twcss.toml");
    fs::write(
        &config,
        format!(
            "[dist]\ndir = {:?}\n\n[output]\nminify = true\n",
            fixture_dist().display().to_string()
        ),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("-")
        .write_stdin("@tailwind components;");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(".container{width:100%}"));
}

#[test]
fn purge_disabled_in_config_keeps_every_utility() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), r#"<p class="font-bold">"#).unwrap();
    fs::write(
        dir.path().join("twcss.toml"),
        "[purge]\nenabled = false\npaths = [\".\"]\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("--dist")
        .arg(fixture_dist())
        .write_stdin("@tailwind utilities;");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(".px-1{"))
        .stdout(predicate::str::contains(".font-bold{"));
}

#[test]
fn purge_paths_from_config_and_flags_combine() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a/index.html"), r#"<p class="font-bold">"#).unwrap();
    fs::write(dir.path().join("b/index.html"), r#"<p class="py-2">"#).unwrap();
    fs::write(dir.path().join("twcss.toml"), "[purge]\npaths = [\"a\"]\n").unwrap();

    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("--dist")
        .arg(fixture_dist())
        .arg("--purge")
        .arg("b")
        .write_stdin("@tailwind utilities;");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(".font-bold{"))
        .stdout(predicate::str::contains(".py-2{"))
        .stdout(predicate::str::contains(".px-1{").not());
}

#[test]
fn inline_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("--dist")
        .arg(fixture_dist())
        .arg("--inline")
        .write_stdin("color: red; @apply px-1");

    cmd.assert()
        .success()
        .stdout("color:red;padding-left:0.25rem;padding-right:0.25rem;");
}

#[test]
fn missing_dist_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path()).write_stdin(".a { b: c }");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no tailwind distribution configured"));
}

#[test]
fn conversion_errors_name_the_input() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.css"), "@tailwind otherthing;").unwrap();

    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("bad.css")
        .arg("--dist")
        .arg(fixture_dist());

    cmd.assert().failure().code(1).stderr(predicate::str::contains(
        "bad.css: @tailwind followed by unknown identifier: otherthing",
    ));
}

#[test]
fn missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("twcss");
    cmd.current_dir(dir.path())
        .arg("nope.css")
        .arg("--dist")
        .arg(fixture_dist());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot open nope.css"));
}
