use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const HEADERS: &str = "Context,Id,Type,FieldSize,LocationInGame,TechNotes,ENLastUpdated,EN,FR,FRVerify,FRCheck,FRLastImported";

fn bin_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gxlate").expect("binary built");
    cmd.current_dir(dir).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

/// Project layout the commands expect when run from its root:
/// `gxlate.toml`, `props/` and a one-document `workbook/`.
fn project(english: &str, tab_rows: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(
        root.join("gxlate.toml"),
        "languages = [\"fr\"]\nprops_dir = \"props\"\nworkbook = \"workbook\"\ndoc_name = \"Strings\"\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("props")).unwrap();
    fs::write(root.join("props/greet.properties"), english).unwrap();

    let doc = root.join("workbook/Strings");
    fs::create_dir_all(&doc).unwrap();
    let mut csv = format!("{HEADERS}\n");
    for row in tab_rows {
        csv.push_str(row);
        csv.push('\n');
    }
    fs::write(doc.join("greet.csv"), csv).unwrap();
    dir
}

fn stdout_json(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(assert.get_output().stdout.as_ref()).to_string();
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    bin_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("check-props"));
}

#[test]
fn check_props_reports_loaded_files() {
    let dir = project("m.hi = Hi\n", &[]);
    bin_cmd(dir.path())
        .args(["--quiet", "check-props"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All props files loaded successfully: 1"));
}

#[test]
fn check_props_fails_on_duplicate_id() {
    let dir = project("m.hi = Hi\n", &[]);
    fs::write(dir.path().join("props/broken.properties"), "m.x = a\nm.x = b\n").unwrap();
    bin_cmd(dir.path())
        .args(["--quiet", "check-props", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken.properties"));
}

#[test]
fn upload_json_report() {
    let dir = project("m.hi = Hi\nm.bye = Bye\n", &["greet,m.bye,,,,,,Bye,,,,"]);
    let mut cmd = bin_cmd(dir.path());
    cmd.args(["--quiet", "upload", "--format", "json"]);
    let v = stdout_json(&mut cmd);
    insta::assert_json_snapshot!(v, @r###"
    {
      "added": 1,
      "bundles": 1,
      "check_only": false,
      "document": "Strings",
      "failures": [],
      "removed": 0,
      "schema_version": 1,
      "tabs": [
        {
          "added": 1,
          "bundle": "greet.properties",
          "removed": 0,
          "stale": 0,
          "tab": "greet",
          "updated": 0
        }
      ],
      "updated": 0
    }
    "###);

    let csv = fs::read_to_string(dir.path().join("workbook/Strings/greet.csv")).unwrap();
    assert!(csv.contains("m.hi"));
    assert!(csv.contains("NEW_FR"));
}

#[test]
fn upload_check_only_leaves_workbook() {
    let dir = project("m.hi = Hi\n", &[]);
    let tab = dir.path().join("workbook/Strings/greet.csv");
    let before = fs::read_to_string(&tab).unwrap();
    bin_cmd(dir.path())
        .args(["--quiet", "upload", "--check-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(check only)"));
    assert_eq!(fs::read_to_string(&tab).unwrap(), before);
}

#[test]
fn download_writes_language_bundle() {
    let dir = project("m.hi = Hi\nm.bye = Bye\n", &["greet,m.hi,,,,,,Hi,Salut,,,"]);
    let mut cmd = bin_cmd(dir.path());
    cmd.args(["--quiet", "download", "--format", "json"]);
    let v = stdout_json(&mut cmd);
    assert_eq!(v["languages"][0]["language"], "fr");
    assert_eq!(v["languages"][0]["updated"], 1);
    assert_eq!(v["languages"][0]["placeholders"], 1);

    let fr = fs::read_to_string(dir.path().join("props/greet_fr.properties")).unwrap();
    assert_eq!(fr, "m.hi = Salut\nm.bye = [fr] Bye\n");
}

#[test]
fn download_without_languages_fails() {
    let dir = project("m.hi = Hi\n", &[]);
    bin_cmd(dir.path())
        .args(["--quiet", "download", "--languages", ""])
        .assert()
        .failure();
}

#[test]
fn doc_test_lists_tabs() {
    let dir = project("m.hi = Hi\n", &["greet,m.hi,,,,,,Hi,,,,"]);
    let mut cmd = bin_cmd(dir.path());
    cmd.args(["--quiet", "doc-test", "--mode", "rows", "--format", "json"]);
    let v = stdout_json(&mut cmd);
    assert_eq!(v["document"], "Strings");
    assert_eq!(v["entries"][0]["name"], "greet");
    assert_eq!(v["entries"][0]["rows"], 1);
}

#[test]
fn create_template_writes_header_row() {
    let dir = project("m.hi = Hi\n", &[]);
    bin_cmd(dir.path())
        .args(["--quiet", "create-template", "--languages", "fr,de"])
        .assert()
        .success();
    let csv = fs::read_to_string(dir.path().join("workbook/Strings/template.csv")).unwrap();
    let header = csv.lines().next().unwrap_or_default();
    assert!(header.starts_with("Context,Id,Type"));
    assert!(header.ends_with("DE,DEVerify,DECheck,DELastImported"));
}

#[test]
fn unknown_doc_is_an_error() {
    let dir = project("m.hi = Hi\n", &[]);
    bin_cmd(dir.path())
        .args(["--quiet", "--doc", "Nope", "upload"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nope"));
}

#[test]
fn schema_dumps_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("schemas");
    bin_cmd(dir.path())
        .args(["--quiet", "schema", "--out-dir"])
        .arg(&out)
        .assert()
        .success();
    for name in [
        "upload_report.schema.json",
        "download_report.schema.json",
        "check_report.schema.json",
    ] {
        let text = fs::read_to_string(out.join(name)).unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert!(v.get("properties").is_some(), "{name} has properties");
    }
}

#[test]
fn upload_warns_about_missing_tab() {
    let dir = project("m.hi = Hi\n", &[]);
    fs::write(dir.path().join("props/other.properties"), "m.x = X\n").unwrap();
    bin_cmd(dir.path())
        .args(["--quiet", "upload"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 operation(s) failed:"))
        .stderr(predicate::str::contains("other.properties"));
}
