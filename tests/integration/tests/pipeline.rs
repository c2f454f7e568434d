//! End-to-end tests for the extraction pipeline
//!
//! Configuration, planning, extraction, grouping and actions against
//! recorded output of real tools, on both evaluators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anylint_core::{
    Context, ContextInput, DiagnosticSet, Event, Invocation, LinterConfig, Position, Range,
    ResolvedAction, Severity, plan_lint_pass,
};
use anylint_expr::{EvaluationChannel, Evaluator, InlineEvaluator};
use anylint_text::TextDocument;
use pretty_assertions::assert_eq;
use rstest::rstest;

const CONFIG: &str = r#"{
  "linters": [
    {
      "name": "gcc",
      "binPath": "gcc",
      "args": ["-fsyntax-only", "${fileBasename}"],
      "condition": "$.languageId === 'c'",
      "diagnostic": {
        "format": "${file}:${startLine}:${startColumn}: ${severity}: ${message} [${flag}]",
        "severityMap": { "warning": "warning", "error": "error", "note": "info" }
      }
    },
    {
      "name": "eslint",
      "binPath": "npx",
      "args": ["eslint", "--format", "json", "${file}"],
      "on": ["save", "change"],
      "diagnostic": {
        "type": "json",
        "output": "stdout",
        "columnCharacterBased": true,
        "selectors": {
          "diagnostics": "$",
          "file": "filePath",
          "subDiagnostics": "messages",
          "startLine": "line",
          "startColumn": "column",
          "endLine": "endLine",
          "endColumn": "endColumn",
          "message": "message + ' (' + ruleId + ')'",
          "severity": "severity === 2 ? 'error' : 'warning'"
        }
      }
    },
    {
      "name": "hadolint",
      "binPath": "hadolint",
      "args": ["--format", "yaml", "-"],
      "on": ["change"],
      "diagnostic": {
        "type": "yaml",
        "output": "stdout",
        "severityMap": { "warning": "warning", "info": "info", "error": "error" },
        "selectors": {
          "diagnostics": "$",
          "file": "file",
          "startLine": "line",
          "startColumn": "column",
          "message": "'[' + code + '] ' + message",
          "severity": "level"
        },
        "actions": [
          {
            "type": "openUri",
            "title": "'Show ' + $$.code",
            "condition": "$$.code.startsWith('DL')",
            "uri": "'https://github.com/hadolint/hadolint/wiki/' + $$.code"
          },
          {
            "type": "ignore",
            "title": "'Ignore ' + $$.code",
            "comment": "'# hadolint ignore=' + $$.code"
          }
        ]
      }
    }
  ]
}"#;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name)).unwrap()
}

fn evaluator(isolated: bool) -> Box<dyn Evaluator> {
    if isolated {
        Box::new(EvaluationChannel::open().unwrap())
    } else {
        Box::new(InlineEvaluator::new())
    }
}

fn context(file: &Path, language_id: &str) -> Context {
    Context::new(ContextInput {
        workspace_folders: vec![PathBuf::from("/project")],
        file: file.to_path_buf(),
        language_id: language_id.to_string(),
        ..Default::default()
    })
}

async fn plan(context: &Context, event: Event, evaluator: &dyn Evaluator) -> Vec<Invocation> {
    let config = LinterConfig::from_jsonc(CONFIG).unwrap();
    plan_lint_pass(&config, context, event, evaluator).await
}

async fn run(
    invocation: Invocation,
    context: Context,
    output: &str,
    document: &TextDocument,
    evaluator: &dyn Evaluator,
) -> DiagnosticSet {
    DiagnosticSet::extract(
        output,
        &invocation.name,
        Arc::new(invocation.spec),
        Arc::new(context),
        document,
        evaluator,
    )
    .await
}

#[rstest]
#[case::inline(false)]
#[case::isolated(true)]
#[tokio::test(flavor = "multi_thread")]
async fn gcc_lines_with_byte_columns(#[case] isolated: bool) {
    let evaluator = evaluator(isolated);
    let ctx = context(Path::new("/project/main.c"), "c");
    let mut invocations = plan(&ctx, Event::Save, evaluator.as_ref()).await;
    let names: Vec<&str> = invocations.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["gcc", "eslint"]);

    let gcc = invocations.remove(0);
    assert_eq!(gcc.args, vec!["-fsyntax-only", "main.c"]);
    assert_eq!(gcc.cwd, "/project");

    let document = TextDocument::new(&fixture("main.c"));
    let set = run(gcc, ctx, &fixture("gcc.txt"), &document, evaluator.as_ref()).await;

    assert_eq!(set.len(), 2);
    assert!(set.has_errors());
    let unused = &set.diagnostics[0];
    assert_eq!(unused.severity, Severity::Warning);
    assert_eq!(unused.message, "unused variable 'ü'");
    assert_eq!(
        unused.raw.member("flag").unwrap().as_str(),
        Some("-Wunused-variable")
    );
    assert_eq!(
        unused.range,
        Range::new(Position::new(2, 8), Position::new(2, 14))
    );
    let implicit = &set.diagnostics[1];
    assert_eq!(implicit.severity, Severity::Error);
    assert_eq!(implicit.range.start, Position::new(3, 4));
}

#[rstest]
#[case::inline(false)]
#[case::isolated(true)]
#[tokio::test(flavor = "multi_thread")]
async fn eslint_json_with_sub_diagnostics(#[case] isolated: bool) {
    let evaluator = evaluator(isolated);
    let ctx = context(Path::new("/project/src/app.js"), "javascript");
    let invocations = plan(&ctx, Event::Save, evaluator.as_ref()).await;
    let Some(eslint) = invocations.into_iter().find(|i| i.name == "eslint") else {
        panic!("eslint was not planned");
    };
    assert_eq!(eslint.args.last().unwrap(), "/project/src/app.js");

    let document = TextDocument::new("const x = 1;\nconsole.log(1)\n");
    let set = run(eslint, ctx, &fixture("eslint.json"), &document, evaluator.as_ref()).await;

    let got: Vec<(String, Range, Severity, String)> = set
        .diagnostics
        .iter()
        .map(|d| (d.file.clone(), d.range, d.severity, d.message.clone()))
        .collect();
    assert_eq!(
        got,
        vec![
            (
                "/project/src/app.js".to_string(),
                Range::new(Position::new(0, 6), Position::new(0, 7)),
                Severity::Error,
                "'x' is assigned a value but never used. (no-unused-vars)".to_string(),
            ),
            (
                "/project/src/app.js".to_string(),
                Range::new(Position::new(1, 13), Position::new(1, 14)),
                Severity::Warning,
                "Missing semicolon. (semi)".to_string(),
            ),
        ]
    );
}

#[rstest]
#[case::inline(false)]
#[case::isolated(true)]
#[tokio::test(flavor = "multi_thread")]
async fn hadolint_yaml_with_actions_and_grouping(#[case] isolated: bool) {
    let dir = tempfile::tempdir().unwrap();
    let dockerfile = dir.path().join("Dockerfile");
    let text = "FROM debian\nWORKDIR /app\n  RUN apt-get install -y curl\n";
    std::fs::write(&dockerfile, text).unwrap();

    let evaluator = evaluator(isolated);
    let ctx = context(&dockerfile, "dockerfile");
    let invocations = plan(&ctx, Event::Change, evaluator.as_ref()).await;
    let names: Vec<&str> = invocations.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["eslint", "hadolint"]);
    assert!(invocations.iter().all(|i| i.pipe_stdin));

    let Some(hadolint) = invocations.into_iter().find(|i| i.name == "hadolint") else {
        panic!("hadolint was not planned");
    };
    let cwd = PathBuf::from(&hadolint.cwd);
    assert_eq!(cwd, dir.path());

    let document = TextDocument::new(text);
    let set = run(hadolint, ctx, &fixture("hadolint.yaml"), &document, evaluator.as_ref()).await;
    assert_eq!(set.len(), 2);
    assert!(!set.has_errors());
    assert_eq!(set.diagnostics[1].severity, Severity::Info);
    assert_eq!(
        set.diagnostics[0].message,
        "[DL3006] Always tag the version of an image explicitly"
    );

    let grouped = set.group_by_file(&cwd, |p| p.exists());
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[&dockerfile].len(), 2);

    let actions = set
        .actions_for(&set.diagnostics[1], &document, document.eol(), evaluator.as_ref())
        .await;
    let titles: Vec<&str> = actions.iter().map(ResolvedAction::title).collect();
    assert_eq!(titles, vec!["Show DL3008", "Ignore DL3008"]);
    match &actions[1] {
        ResolvedAction::Ignore { edit, .. } => {
            assert_eq!(edit.range.start, Position::new(2, 0));
            assert_eq!(edit.new_text, "  # hadolint ignore=DL3008\n");
        }
        other => panic!("expected ignore action, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_passes_share_one_channel() {
    let channel = EvaluationChannel::open().unwrap();
    let ctx = context(Path::new("/project/src/app.js"), "javascript");
    let mut invocations = plan(&ctx, Event::Force, &channel).await;
    // gcc is excluded by its condition
    assert_eq!(invocations.len(), 2);
    let hadolint = invocations.pop().unwrap();
    let eslint = invocations.pop().unwrap();

    let document = TextDocument::new("const x = 1;\nconsole.log(1)\n");
    let eslint_output = fixture("eslint.json");
    let hadolint_output = fixture("hadolint.yaml");
    let (eslint_set, hadolint_set) = tokio::join!(
        run(eslint, ctx.clone(), &eslint_output, &document, &channel),
        run(hadolint, ctx, &hadolint_output, &document, &channel),
    );

    assert_eq!(eslint_set.source, "eslint");
    assert_eq!(eslint_set.len(), 2);
    assert!(eslint_set.diagnostics.iter().all(|d| d.source == "eslint"));
    assert_eq!(hadolint_set.len(), 2);
    assert!(hadolint_set.diagnostics.iter().all(|d| d.file == "Dockerfile"));
    assert_eq!(channel.pending(), 0);
    channel.shutdown();
}

#[tokio::test]
async fn malformed_output_only_empties_its_own_pass() {
    let evaluator = InlineEvaluator::new();
    let ctx = context(Path::new("/project/main.c"), "c");
    let mut invocations = plan(&ctx, Event::Force, &evaluator).await;
    let eslint = invocations.remove(1);
    let gcc = invocations.remove(0);
    let document = TextDocument::new("a\nb\nc\nd\n");

    let broken = run(eslint, ctx.clone(), "[{\"filePath\": ", &document, &evaluator).await;
    assert!(broken.is_empty());

    let fine = run(gcc, ctx, &fixture("gcc.txt"), &document, &evaluator).await;
    assert_eq!(fine.len(), 2);
}
