//! CLI regression tests for `lint`: embedded and explicit catalogs, stdin
//! input, rule selection, and the JSON output contract.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use assert_cmd::cargo;

fn cmdlint() -> Command {
    Command::new(cargo::cargo_bin!("cmdlint"))
}

fn write_temp(name: &str, content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write temp file");
    (dir, path.to_string_lossy().to_string())
}

fn run_with_stdin(args: &[&str], stdin_body: &str) -> std::process::Output {
    let mut child = cmdlint()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn cmdlint");

    {
        let stdin = child.stdin.as_mut().expect("stdin handle");
        stdin
            .write_all(stdin_body.as_bytes())
            .expect("write stdin body");
    }

    child.wait_with_output().expect("wait for output")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn issue_rules(json: &serde_json::Value) -> Vec<String> {
    json["issues"]
        .as_array()
        .expect("issues array")
        .iter()
        .filter_map(|i| i["rule_name"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn lint_flags_missing_mandatory_parameter_with_embedded_catalog() {
    let (_dir, path) = write_temp("a.ps1", "Get-ChildItem\nRename-Item -Force\n");
    let output = cmdlint()
        .args(["lint", &path, "--output", "json"])
        .output()
        .expect("run lint");

    // Warnings do not fail the run.
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    let issues = json["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    assert_eq!(issue["rule_name"], "PSUseCmdletCorrectly");
    assert_eq!(issue["severity"], "warning");
    assert_eq!(issue["context"]["command"], "Rename-Item");
    assert_eq!(issue["file"], path.as_str());
    assert_eq!(issue["line"], 2);
    assert_eq!(issue["column"], 1);
}

#[test]
fn lint_accepts_positional_arguments() {
    let (_dir, path) = write_temp("a.ps1", "Rename-Item old.txt new.txt\n");
    let output = cmdlint()
        .args(["lint", &path, "--output", "json"])
        .output()
        .expect("run lint");
    assert!(output.status.success());
    assert!(issue_rules(&stdout_json(&output)).is_empty());
}

#[test]
fn lint_reports_alias_as_written() {
    let output = run_with_stdin(&["lint", "-", "--output", "json"], "sls -CaseSensitive\n");
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["issues"][0]["context"]["command"], "sls");
    assert_eq!(json["issues"][0]["context"]["resolved"], "Select-String");
    assert_eq!(json["issues"][0]["file"], "<stdin>");
}

#[test]
fn lint_with_explicit_catalog() {
    let catalog = r#"{
        // JSONC comments are accepted.
        "schema_version": "1.0.0",
        "commands": [{
            "name": "Invoke-Deploy",
            "kind": "cmdlet",
            "parameters": [
                { "name": "Target", "attributes": [{ "mandatory": true }] },
                { "name": "WhatIf", "switch": true, "attributes": [{}] }
            ]
        }],
        "aliases": { "deploy": "Invoke-Deploy" }
    }"#;
    let (_cat_dir, cat_path) = write_temp("catalog.jsonc", catalog);
    let (_dir, path) = write_temp(
        "deploy.ps1",
        "Invoke-Deploy -WhatIf\ndeploy -Target prod\nRename-Item -Force\n",
    );
    let output = cmdlint()
        .args(["lint", &path, "--catalog", &cat_path, "--output", "json"])
        .output()
        .expect("run lint");
    assert!(output.status.success());
    let json = stdout_json(&output);
    let issues = json["issues"].as_array().expect("issues array");
    // Rename-Item is not in this catalog, so only Invoke-Deploy is flagged.
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["context"]["command"], "Invoke-Deploy");
}

#[test]
fn lint_exclude_rule_silences_it() {
    let output = run_with_stdin(
        &[
            "lint",
            "-",
            "--exclude-rule",
            "psusecmdletcorrectly",
            "--output",
            "json",
        ],
        "Rename-Item -Force\n",
    );
    assert!(output.status.success());
    assert!(issue_rules(&stdout_json(&output)).is_empty());
}

#[test]
fn lint_include_rule_runs_it() {
    let output = run_with_stdin(
        &[
            "lint",
            "-",
            "--include-rule",
            "PSUseCmdletCorrectly",
            "--output",
            "json",
        ],
        "Rename-Item -Force\n",
    );
    assert!(output.status.success());
    assert_eq!(
        issue_rules(&stdout_json(&output)),
        ["PSUseCmdletCorrectly"]
    );
}

#[test]
fn lint_parse_errors_fail_the_run() {
    let output = run_with_stdin(
        &["lint", "-", "--output", "json"],
        "Rename-Item -Force\nWrite-Output 'open\n",
    );
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(
        issue_rules(&json),
        ["PSParseUnterminatedString", "PSUseCmdletCorrectly"]
    );
}

#[test]
fn lint_pretty_output_goes_to_stderr() {
    let output = run_with_stdin(&["lint", "-", "--output", "pretty"], "Get-Date\n");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("lint ok"));
}

#[test]
fn lint_pretty_output_names_the_rule() {
    let output = run_with_stdin(&["lint", "-", "--output", "pretty"], "Rename-Item -Force\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PSUseCmdletCorrectly"), "stderr={stderr}");
    assert!(stderr.contains("1 warning"), "stderr={stderr}");
}
