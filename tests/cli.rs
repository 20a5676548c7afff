use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn temp_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Program.cs");
    fs::write(&file, contents.as_bytes()).unwrap();
    (dir, file)
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn codecursor(args: &[&str], file: &Path, commands: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_codecursor"))
        .env_remove("CODECURSOR_DELIMITERS")
        .args(args)
        .arg(file)
        .args(commands)
        .output()
        .unwrap()
}

fn maskview(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_maskview"))
        .env_remove("CODECURSOR_DELIMITERS")
        .args(args)
        .output()
        .unwrap()
}

const IF_BLOCK: &str = "  if (x) {\n    return 1;\n  }\n";

#[test]
fn codecursor_inplace_insert_prints_modified_lines() {
    let (_dir, file) = temp_file(IF_BLOCK);

    let out = codecursor(&[], &file, &["line }", "rfind return", "insert log();"]);
    assert!(out.status.success());

    // Only the inserted line is printed, 1-based.
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout, "3:     log();\n");

    assert_eq!(
        read_file(&file),
        "  if (x) {\n    return 1;\n    log();\n  }\n"
    );
}

#[test]
fn codecursor_dry_run_does_not_write() {
    let (_dir, file) = temp_file(IF_BLOCK);

    let out = codecursor(&["--dry-run"], &file, &["find return", "replace/1/2/"]);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout, "2:     return 2;\n");

    // File unchanged.
    assert_eq!(read_file(&file), IF_BLOCK);
}

#[test]
fn codecursor_failed_command_leaves_file_unchanged() {
    let (_dir, file) = temp_file(IF_BLOCK);

    let out = codecursor(&[], &file, &["insert first();", "find nothing here"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("command 2 failed"), "stderr: {stderr}");

    assert_eq!(read_file(&file), IF_BLOCK);
}

#[test]
fn codecursor_searches_skip_comments_and_strings() {
    let (_dir, file) = temp_file("// Foo here\nvar s = \"Foo\";\nFoo();\n");

    let out = codecursor(&[], &file, &["find Foo", "append  // found"]);
    assert!(out.status.success());

    assert_eq!(
        read_file(&file),
        "// Foo here\nvar s = \"Foo\";\nFoo(); // found\n"
    );
}

#[test]
fn codecursor_create_builds_a_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("New.cs");

    let out = codecursor(
        &["--create"],
        &file,
        &["insert using System;", "insert namespace N;"],
    );
    assert!(out.status.success());

    assert_eq!(read_file(&file), "using System;\nnamespace N;\n");
}

#[test]
fn codecursor_reads_script_file() {
    let (dir, file) = temp_file("call(a,\n  b);\nnext();\n");
    let script = dir.path().join("edit.script");
    fs::write(&script, "# wrap the call\nfind call(\nbracket/call(/.await/\n").unwrap();

    let script_arg = script.to_str().unwrap();
    let out = codecursor(&["--script", script_arg], &file, &[]);
    assert!(out.status.success());

    assert_eq!(read_file(&file), "call(a,\n  b).await;\nnext();\n");
}

#[test]
fn codecursor_custom_delimiters() {
    let (_dir, file) = temp_file("x = 1  # TODO\nTODO = 2\n");

    let out = codecursor(&["--delimiters", "#"], &file, &["find TODO", "replace/2/3/"]);
    assert!(out.status.success());

    assert_eq!(read_file(&file), "x = 1  # TODO\nTODO = 3\n");
}

#[test]
fn codecursor_exit_codes() {
    let (dir, file) = temp_file(IF_BLOCK);

    let out = codecursor(&["--delimiters", "//,//"], &file, &["top"]);
    assert_eq!(out.status.code(), Some(2));

    let out = codecursor(&[], &file, &["frobnicate"]);
    assert_eq!(out.status.code(), Some(2));

    let out = codecursor(&[], &dir.path().join("missing.cs"), &["top"]);
    assert_eq!(out.status.code(), Some(1));

    assert_eq!(read_file(&file), IF_BLOCK);
}

#[test]
fn maskview_full_and_range() {
    let (_dir, file) = temp_file("a // x\nb \"s\"\n/* c\nd */ e\n");
    let path = file.to_str().unwrap();

    let out = maskview(&[path]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let expected = [
        format!("1  a{}", " ".repeat(5)),
        format!("2  b{}", " ".repeat(4)),
        format!("3  {}", " ".repeat(4)),
        format!("4  {}e", " ".repeat(5)),
    ]
    .join("\n")
        + "\n";
    assert_eq!(stdout, expected);

    // Range 2..3
    let out = maskview(&[path, "2", "3"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let expected = format!("2  b{}\n3  {}\n", " ".repeat(4), " ".repeat(4));
    assert_eq!(stdout, expected);

    let out = maskview(&[path, "4", "9"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn maskview_custom_delimiters() {
    let (_dir, file) = temp_file("x # y\n'q' z\n");
    let path = file.to_str().unwrap();

    let out = maskview(&["--delimiters", "#,'", path]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout, format!("1  x{}\n2  {}z\n", " ".repeat(4), " ".repeat(4)));
}
