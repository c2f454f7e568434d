//! Integration tests for CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a command for the anylint CLI
fn anylint_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_anylint"))
}

const CONFIG: &str = r#"{
  // line-oriented tool
  "linters": [
    {
      "name": "tsc",
      "binPath": "tsc",
      "cwd": "${workspaceFolder}",
      "diagnostic": {
        "output": "stdout",
        "format": "${file}(${startLine},${startColumn}): ${severity} ${code}: ${message}",
        "actions": [
          { "type": "openUri", "title": "'Explain ' + $$.code", "uri": "'https://ts.dev/' + $$.code" }
        ]
      }
    },
    {
      "name": "yamllint",
      "binPath": "yamllint",
      "on": ["change"],
      "condition": "$.fileExtname === '.yml'",
      "diagnostic": {
        "type": "yaml",
        "severity": "warning",
        "selectors": {
          "diagnostics": "problems",
          "file": "path",
          "startLine": "line",
          "startColumn": "column",
          "message": "text"
        }
      }
    }
  ]
}"#;

/// Creates a workspace with the config and a document at `src/a.ts`.
fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".anylint.jsonc"), CONFIG).unwrap();
    fs::create_dir(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src").join("a.ts"),
        "const a = 1\nlet b = 2\n",
    )
    .unwrap();
    temp_dir
}

fn document(dir: &Path) -> String {
    dir.join("src").join("a.ts").display().to_string()
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        anylint_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }

    #[test]
    fn shows_version_with_flag() {
        anylint_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

mod init_command {
    use super::*;

    #[test]
    fn creates_new_config_file() {
        let temp_dir = TempDir::new().unwrap();

        anylint_cmd()
            .current_dir(temp_dir.path())
            .arg("init")
            .assert()
            .success()
            .stderr(predicate::str::contains("Created .anylint.jsonc"));

        let content = fs::read_to_string(temp_dir.path().join(".anylint.jsonc")).unwrap();
        assert!(content.contains("linters"));
        assert!(content.contains("${startLine}"));
    }

    #[test]
    fn created_config_is_loadable() {
        let temp_dir = TempDir::new().unwrap();
        anylint_cmd()
            .current_dir(temp_dir.path())
            .arg("init")
            .assert()
            .success();

        fs::write(temp_dir.path().join("x.txt"), "").unwrap();
        anylint_cmd()
            .current_dir(temp_dir.path())
            .args(["plan", "--document", "x.txt"])
            .assert()
            .success();
    }

    #[test]
    fn fails_when_config_exists_without_force() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".anylint.jsonc"), "{}").unwrap();

        anylint_cmd()
            .current_dir(temp_dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn overwrites_config_with_force() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(".anylint.jsonc");
        fs::write(&config_path, r#"{"custom": "data"}"#).unwrap();

        anylint_cmd()
            .current_dir(temp_dir.path())
            .args(["init", "--force"])
            .assert()
            .success();

        let content = fs::read_to_string(config_path).unwrap();
        assert!(!content.contains("custom"));
    }
}

mod extract_command {
    use super::*;

    #[test]
    fn reports_error_diagnostics_with_exit_code_1() {
        let dir = workspace();
        let output = dir.path().join("tsc.out");
        fs::write(
            &output,
            "src/a.ts(2,5): error TS2304: Cannot find name 'b'.\nnoise line\n",
        )
        .unwrap();

        anylint_cmd()
            .current_dir(dir.path())
            .args(["extract", "--linter", "tsc", "--document"])
            .arg(document(dir.path()))
            .arg("--input")
            .arg(&output)
            .assert()
            .code(1)
            .stdout(predicate::str::contains(
                "a.ts:2:5 error [tsc]: Cannot find name 'b'.",
            ))
            .stdout(predicate::str::contains("action: Explain TS2304"))
            .stdout(predicate::str::contains("Found 1 diagnostics (1 errors)"));
    }

    #[test]
    fn unmapped_severity_falls_back_and_json_output() {
        let dir = workspace();

        let assert = anylint_cmd()
            .current_dir(dir.path())
            .args(["extract", "--linter", "tsc", "--format", "json", "--document"])
            .arg(document(dir.path()))
            .write_stdin("src/a.ts(1,7): warning TS6133: 'a' is declared but never used.\n")
            .assert()
            .success();

        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        let report = &reports[0];
        assert_eq!(report["diagnostic"]["severity"], "warning");
        assert_eq!(report["diagnostic"]["range"]["start"]["line"], 0);
        assert_eq!(report["diagnostic"]["range"]["start"]["column"], 6);
        assert_eq!(report["diagnostic"]["rawCaptured"]["code"], "TS6133");
        assert_eq!(report["actions"][0]["uri"], "https://ts.dev/TS6133");
        assert!(
            report["path"]
                .as_str()
                .unwrap()
                .ends_with("a.ts")
        );
    }

    #[test]
    fn structured_output_on_isolated_worker() {
        let dir = workspace();
        let yml = dir.path().join("c.yml");
        fs::write(&yml, "key: value  \n").unwrap();
        let problems = "problems:\n  - path: c.yml\n    line: 1\n    column: 11\n    text: trailing spaces\n";

        anylint_cmd()
            .current_dir(dir.path())
            .args(["extract", "--linter", "yamllint", "--event", "change", "--isolated"])
            .arg("--document")
            .arg(&yml)
            .write_stdin(problems)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "c.yml:1:11 warning [yamllint]: trailing spaces",
            ));
    }

    #[test]
    fn skipped_linter_reports_nothing() {
        let dir = workspace();
        anylint_cmd()
            .current_dir(dir.path())
            .args(["extract", "--linter", "yamllint", "--event", "change", "--document"])
            .arg(document(dir.path()))
            .write_stdin("problems: []")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn unknown_linter_fails() {
        let dir = workspace();
        anylint_cmd()
            .current_dir(dir.path())
            .args(["extract", "--linter", "eslint", "--document"])
            .arg(document(dir.path()))
            .write_stdin("")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("not configured"));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = workspace();
        fs::write(
            dir.path().join(".anylint.jsonc"),
            r#"{ "linters": [{ "name": "x", "on": ["commit"] }] }"#,
        )
        .unwrap();
        anylint_cmd()
            .current_dir(dir.path())
            .args(["extract", "--linter", "x", "--document"])
            .arg(document(dir.path()))
            .write_stdin("")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Config validation failed"));
    }
}

mod plan_command {
    use super::*;

    #[test]
    fn lists_linters_for_event() {
        let dir = workspace();
        anylint_cmd()
            .current_dir(dir.path())
            .args(["plan", "--document"])
            .arg(document(dir.path()))
            .assert()
            .success()
            .stdout(predicate::str::contains("tsc: tsc"))
            .stdout(predicate::str::contains("yamllint").not());
    }

    #[test]
    fn change_event_pipes_stdin_as_json() {
        let dir = workspace();
        let yml = dir.path().join("c.yml");
        fs::write(&yml, "").unwrap();
        let assert = anylint_cmd()
            .current_dir(dir.path())
            .args(["plan", "--event", "change", "--format", "json", "--document"])
            .arg(&yml)
            .assert()
            .success();
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let plan: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(plan.as_array().unwrap().len(), 1);
        assert_eq!(plan[0]["name"], "yamllint");
        assert_eq!(plan[0]["pipeStdin"], true);
        assert_eq!(plan[0]["output"], "stderr");
    }

    #[test]
    fn rejects_unknown_event() {
        anylint_cmd()
            .args(["plan", "--event", "commit", "--document", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown event"));
    }
}

mod eval_command {
    use super::*;

    #[test]
    fn evaluates_arithmetic() {
        anylint_cmd()
            .args(["eval", "1 + 2 * 3"])
            .assert()
            .success()
            .stdout(predicate::str::diff("7\n"));
    }

    #[test]
    fn binds_raw_data() {
        anylint_cmd()
            .args(["eval", "--raw", r#"{"code": "E501"}"#, "$$.code.toLowerCase()"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"e501\""));
    }

    #[test]
    fn binds_document_context() {
        let dir = workspace();
        anylint_cmd()
            .current_dir(dir.path())
            .args(["eval", "--document"])
            .arg(document(dir.path()))
            .arg("$.fileBasename + ':' + $.lineNumber")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"a.ts:1\""));
    }

    #[test]
    fn undefined_identifier_fails() {
        anylint_cmd()
            .args(["eval", "nope + 1"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("nope is not defined"));
    }
}
