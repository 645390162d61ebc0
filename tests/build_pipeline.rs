// tests/build_pipeline.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{Project, TestResult, init_tracing, orchestrator, with_timeout};

use assetpipe::config::{ConfigFile, GroupConfig, default_raw_config};
use assetpipe::errors::PipelineError;
use assetpipe::types::{BuildMode, TaskKind};

fn classic_project() -> Project {
    let project = Project::new();
    project
        .write("src/css/site.css", "body { color: #ffffff; }\n")
        .write("src/css/print/page.css", "@media print { a { color: red } }\n")
        .write("src/js/app.js", "var answer = 42;\nwindow.answer = answer;\n")
        .write("src/index.html", "<html><body><!--partial:nav.html--></body></html>\n")
        .write("src/partials/nav.html", "<nav>menu</nav>")
        .write("src/fonts/sans.woff2", "font-bytes")
        .write("src/images/logo.svg", "<svg></svg>");
    project
}

fn classic_config() -> ConfigFile {
    ConfigFile::try_from(default_raw_config()).expect("built-in config is valid")
}

#[tokio::test]
async fn build_cleans_then_writes_every_output() -> TestResult {
    init_tracing();
    let project = classic_project();
    project.write("dist/stale.txt", "left over");

    let orch = orchestrator(&project, classic_config(), BuildMode::Development);
    let summary = with_timeout(orch.run_named("build")).await?;

    assert_eq!(summary.failure_count(), 0);
    assert_eq!(
        project.files_under("dist"),
        vec![
            "css/print/page.css",
            "css/site.css",
            "fonts/sans.woff2",
            "images/logo.svg",
            "index.html",
            "js/app.js",
        ]
    );
    assert_eq!(project.read("dist/css/site.css"), "body{color:#fff}");
    assert_eq!(project.read("dist/fonts/sans.woff2"), "font-bytes");
    assert_eq!(
        project.read("dist/index.html"),
        "<html><body><nav>menu</nav></body></html>\n"
    );
    Ok(())
}

#[tokio::test]
async fn rebuild_is_byte_identical() -> TestResult {
    init_tracing();
    let project = classic_project();
    let orch = orchestrator(&project, classic_config(), BuildMode::Production);

    with_timeout(orch.run_named("build")).await?;
    let first: Vec<(String, Vec<u8>)> = project
        .files_under("dist")
        .into_iter()
        .map(|f| {
            let bytes = std::fs::read(project.path(&format!("dist/{f}"))).unwrap();
            (f, bytes)
        })
        .collect();

    with_timeout(orch.run_named("build")).await?;
    let second: Vec<(String, Vec<u8>)> = project
        .files_under("dist")
        .into_iter()
        .map(|f| {
            let bytes = std::fs::read(project.path(&format!("dist/{f}"))).unwrap();
            (f, bytes)
        })
        .collect();

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn single_task_run_leaves_other_outputs_alone() -> TestResult {
    init_tracing();
    let project = classic_project();
    project.write("dist/keep.txt", "untouched");

    let orch = orchestrator(&project, classic_config(), BuildMode::Development);
    let summary = with_timeout(orch.run_named("css")).await?;

    assert_eq!(summary.report("css").map(|r| r.written.len()), Some(2));
    assert_eq!(project.read("dist/keep.txt"), "untouched");
    assert!(!project.exists("dist/js/app.js"));
    Ok(())
}

#[tokio::test]
async fn exclude_globs_skip_files() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("assets/a.txt", "a")
        .write("assets/drafts/b.txt", "b");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "copy",
            TaskConfigBuilder::transform(TaskKind::Copy, "assets/**/*", "dist/assets")
                .exclude("assets/drafts/**")
                .build(),
        )
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);
    with_timeout(orch.run_named("copy")).await?;

    assert_eq!(project.files_under("dist/assets"), vec!["a.txt"]);
    Ok(())
}

#[tokio::test]
async fn missing_source_directory_is_fatal() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/site.css", "a { color: red }");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .with_task(
            "fonts",
            TaskConfigBuilder::transform(TaskKind::Copy, "src/fonts/**/*", "dist/fonts").build(),
        )
        .with_group("build", GroupConfig::series(["fonts", "css"]))
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let err = with_timeout(orch.run_named("build")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Other(_)), "{err:?}");
    assert!(format!("{err:#}").contains("fonts"), "{err:#}");
    // The series halted before css ran.
    assert!(!project.exists("dist/css/site.css"));
    Ok(())
}

#[tokio::test]
async fn missing_bundle_entry_is_fatal() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/site.css", "a { color: red }");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "scripts",
            TaskConfigBuilder::new(TaskKind::Bundle)
                .entry("src/js/main.js")
                .dest("dist/js")
                .build(),
        )
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .with_group("build", GroupConfig::series(["scripts", "css"]))
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let err = with_timeout(orch.run_named("build")).await.unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(ref msg) if msg.contains("main.js")), "{err:?}");
    assert!(!project.exists("dist/css/site.css"));
    assert!(!project.exists("dist/js/main.js"));
    Ok(())
}

#[tokio::test]
async fn parallel_group_finishes_siblings_before_reporting() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/site.css", "a { color: red }");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .with_task(
            "fonts",
            TaskConfigBuilder::transform(TaskKind::Copy, "src/fonts/**/*", "dist/fonts").build(),
        )
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let result = with_timeout(orch.run_named("assets")).await;
    assert!(result.is_err());
    assert_eq!(project.read("dist/css/site.css"), "a{color:red}");
    Ok(())
}

#[tokio::test]
async fn broken_file_is_reported_and_others_still_build() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/good.css", "a { color: red }");
    // Not UTF-8, so it cannot be read as a stylesheet.
    std::fs::write(project.path("src/css/bad.css"), [0xff, 0xfe, 0x00])?;

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/*.css", "dist/css").build(),
        )
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let summary = with_timeout(orch.run_named("css")).await?;
    let report = summary.report("css").expect("css report");
    assert_eq!(report.written.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("src/css/bad.css"));
    assert!(project.exists("dist/css/good.css"));
    assert!(!project.exists("dist/css/bad.css"));

    let err = summary.into_result().unwrap_err();
    assert!(matches!(err, PipelineError::TaskFailures(1)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn overlapping_outputs_are_a_conflict() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("src/a/site.css", "a { color: red }")
        .write("src/b/site.css", "b { color: blue }");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "first",
            TaskConfigBuilder::transform(TaskKind::Css, "src/a/*.css", "dist/css").build(),
        )
        .with_task(
            "second",
            TaskConfigBuilder::transform(TaskKind::Copy, "src/b/*.css", "dist/css").build(),
        )
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let err = with_timeout(orch.run_named("assets")).await.unwrap_err();
    match err {
        PipelineError::OutputConflict { path, first, second } => {
            assert!(path.ends_with("dist/css/site.css"));
            assert_ne!(first, second);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn clean_refuses_to_delete_sources() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/site.css", "a { color: red }");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .with_task("wipe", TaskConfigBuilder::new(TaskKind::Clean).dest("src").build())
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let err = with_timeout(orch.run_named("wipe")).await.unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)), "{err:?}");
    assert!(project.exists("src/css/site.css"));
    Ok(())
}

#[tokio::test]
async fn clean_creates_missing_output_root() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/site.css", "a { color: red }");

    let orch = orchestrator(&project, classic_config_for_css(), BuildMode::Development);
    with_timeout(orch.run_named("clean")).await?;
    assert!(project.path("dist").is_dir());
    assert!(project.files_under("dist").is_empty());
    Ok(())
}

fn classic_config_for_css() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task("clean", TaskConfigBuilder::new(TaskKind::Clean).build())
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .build()
}

#[tokio::test]
async fn unknown_target_is_not_found() {
    let project = Project::new();
    let orch = orchestrator(&project, classic_config_for_css(), BuildMode::Development);
    let err = orch.run_named("deploy").await.unwrap_err();
    assert!(matches!(err, PipelineError::TaskNotFound(_)), "{err:?}");
}
