// tests/lint.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{Project, TestResult, init_tracing, with_timeout};

use std::path::PathBuf;

use assetpipe::config::ConfigFile;
use assetpipe::errors::PipelineError;
use assetpipe::lint::{self, Diagnostic, FileReport, Language, LintReport, Severity};
use assetpipe::tasks::{lint_all, lint_tasks, run_lint};
use assetpipe::types::TaskKind;

fn rules(diags: &[Diagnostic]) -> Vec<&'static str> {
    diags.iter().map(|d| d.rule).collect()
}

fn lint_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task(
            "eslint",
            TaskConfigBuilder::new(TaskKind::Lint).src("src/js/**/*.js").build(),
        )
        .with_task(
            "stylelint",
            TaskConfigBuilder::new(TaskKind::Lint).src("src/scss/**/*.scss").build(),
        )
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .build()
}

#[test]
fn undefined_name_is_reported_with_position() {
    let diags = lint::check(Language::Script, "var total = 1;\nrender(total);\n");
    assert_eq!(rules(&diags), vec!["no-undef"]);
    let d = &diags[0];
    assert_eq!((d.line, d.col), (2, 1));
    assert_eq!(d.severity, Severity::Error);
    assert_eq!(d.message, "'render' is not defined.");
}

#[test]
fn declared_and_global_names_are_fine() {
    let src = "/* global jQuery */\nfunction run(el) {\n  const items = [el];\n  jQuery(items);\n  window.console.log(document.title);\n}\nrun(null);\n";
    assert!(lint::check(Language::Script, src).is_empty());
}

#[test]
fn debugger_and_loose_equality_are_flagged() {
    let diags = lint::check(Language::Script, "if (1 == 2) {\n  debugger;\n}\n");
    assert_eq!(rules(&diags), vec!["eqeqeq", "no-debugger"]);
    assert!(diags[1].fixable);
    assert!(!diags[0].fixable);
}

#[test]
fn script_fix_removes_debugger_and_tidies_lines() {
    let fixed = lint::fix(
        Language::Script,
        "var a = 1;  \ndebugger;\n\n\n\nconsole.log(a)",
    );
    assert_eq!(fixed, "var a = 1;\n\nconsole.log(a)\n");
    assert!(lint::check(Language::Script, &fixed).is_empty());
}

#[test]
fn script_fix_leaves_empty_statement_for_braceless_debugger() {
    let fixed = lint::fix(Language::Script, "if (x) debugger;\nfoo();\n");
    assert_eq!(fixed, "if (x);\nfoo();\n");

    let fixed = lint::fix(Language::Script, "for (;;)\n  debugger;\nfoo();\n");
    assert_eq!(fixed, "for (;;);\nfoo();\n");

    let fixed = lint::fix(Language::Script, "if (x) {\n} else debugger;\nfoo();\n");
    assert_eq!(fixed, "if (x) {\n} else;\nfoo();\n");
}

#[test]
fn style_rules() {
    let diags = lint::check(Language::Style, "a { }\n#ABC { color: #ABC !important; }\n");
    assert_eq!(
        rules(&diags),
        vec!["block-no-empty", "color-hex-case", "declaration-no-important"]
    );
    assert_eq!((diags[1].line, diags[1].col), (2, 15));

    let fixed = lint::fix(Language::Style, "#ABC { color: #ABC; }  ");
    assert_eq!(fixed, "#ABC { color: #abc; }\n");
}

#[test]
fn style_rules_report_every_match_on_each_call() {
    let sheet = "a {}\nb {\n}\nc { color: #FFF; margin: 0 !important; }\nd { top: 0 ! important; }\n";
    for _ in 0..2 {
        let diags = lint::check(Language::Style, sheet);
        assert_eq!(
            rules(&diags),
            vec![
                "block-no-empty",
                "block-no-empty",
                "color-hex-case",
                "declaration-no-important",
                "declaration-no-important",
            ]
        );
        let lines: Vec<usize> = diags.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4, 5]);
    }
}

#[test]
fn report_renders_locations_and_totals() {
    let mut report = LintReport::default();
    report.push(FileReport {
        path: PathBuf::from("src/js/app.js"),
        diagnostics: vec![
            Diagnostic::error("no-undef", 3, 5, "'foo' is not defined."),
            Diagnostic::warning("eol-last", 9, 1, "Newline required at end of file but not found.")
                .fixable(),
        ],
        fixed: false,
    });

    assert_eq!(report.error_count(), 1);
    assert_eq!(report.warning_count(), 1);
    assert_eq!(
        report.render(),
        "src/js/app.js:3:5  error  'foo' is not defined.  no-undef\n\
         src/js/app.js:9:1  warning  Newline required at end of file but not found.  eol-last\n\
         \n\
         2 problems (1 error, 1 warning)\n\
         1 problem potentially fixable with `assetpipe fix`\n"
    );
    assert_eq!(LintReport::default().render(), "");
}

#[tokio::test]
async fn lint_reports_relative_paths_and_fails_on_errors() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("src/js/app.js", "var x = 1;\nmissing(x);\n")
        .write("src/js/ok.js", "var y = 2;\nconsole.log(y);\n");
    let cfg = lint_config();

    // The scss directory does not exist; that pattern is skipped.
    let report = with_timeout(lint_all(&cfg, project.root(), None, false)).await?;
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].path, PathBuf::from("src/js/app.js"));
    assert_eq!(rules(&report.files[0].diagnostics), vec!["no-undef"]);

    let err = with_timeout(run_lint(&cfg, project.root(), None, false))
        .await
        .unwrap_err();
    match err {
        PipelineError::LintFailed { errors, files } => assert_eq!((errors, files), (1, 1)),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn fix_rewrites_sources_and_passes_when_clean() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("src/js/app.js", "var a = 1;   \ndebugger;\nconsole.log(a)")
        .write("src/scss/site.scss", "a { color: #FFF; }\n");
    let cfg = lint_config();

    let report = with_timeout(run_lint(&cfg, project.root(), None, true)).await?;
    assert_eq!(report.fixed_count(), 2);
    assert!(!report.has_errors());
    assert_eq!(project.read("src/js/app.js"), "var a = 1;\nconsole.log(a)\n");
    assert_eq!(project.read("src/scss/site.scss"), "a { color: #fff; }\n");
    Ok(())
}

#[tokio::test]
async fn fix_still_fails_on_unfixable_errors() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/js/app.js", "debugger;\nnope();\n");
    let cfg = lint_config();

    let err = with_timeout(run_lint(&cfg, project.root(), Some("eslint"), true))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::LintFailed { errors: 1, .. }), "{err:?}");
    assert_eq!(project.read("src/js/app.js"), "nope();\n");
    Ok(())
}

#[test]
fn selecting_lint_tasks_by_name() {
    let cfg = lint_config();

    let all: Vec<String> = lint_tasks(&cfg, None)
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(all, vec!["eslint", "stylelint"]);

    assert!(matches!(
        lint_tasks(&cfg, Some("nope")),
        Err(PipelineError::TaskNotFound(_))
    ));
    assert!(matches!(
        lint_tasks(&cfg, Some("css")),
        Err(PipelineError::ConfigError(_))
    ));
}
