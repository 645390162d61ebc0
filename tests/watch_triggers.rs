// tests/watch_triggers.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder, binding};
use crate::common::{Project, TestResult, init_tracing};

use std::sync::{Arc, Mutex};

use assetpipe::config::{ConfigFile, WatchConfig, default_raw_config};
use assetpipe::engine::RuntimeEvent;
use assetpipe::types::TaskKind;
use assetpipe::watch::{
    BindingWatchProfile, IgnoredDirs, MemoryHashStore, build_profiles_from_config,
    collect_matching_files, process_file_change,
};
use tokio::sync::mpsc;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RuntimeEvent::BindingTriggered { binding, .. } = event {
            out.push(binding);
        }
    }
    out
}

#[test]
fn profile_matching_honours_excludes_and_segments() -> TestResult {
    let profile = BindingWatchProfile::new(
        "pages",
        &strings(&["./src/**/*.html"]),
        &strings(&["src/partials/**"]),
        false,
    )?;

    assert!(profile.matches("src/index.html"));
    assert!(profile.matches("src/blog/post.html"));
    assert!(!profile.matches("src/partials/nav.html"));
    assert!(!profile.matches("src/site.css"));

    let flat = BindingWatchProfile::new("css", &strings(&["src/css/*.css"]), &[], false)?;
    assert!(flat.matches("src/css/a.css"));
    assert!(!flat.matches("src/css/nested/b.css"));
    Ok(())
}

#[test]
fn profiles_follow_config_bindings() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/**/*.css", "dist/css").build(),
        )
        .with_binding(
            "styles",
            WatchConfig {
                use_hash: true,
                ..binding(&["src/css/**/*.css"], "css")
            },
        )
        .build();

    let profiles = build_profiles_from_config(&cfg)?;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].name(), "styles");
    assert!(profiles[0].use_hash());
    Ok(())
}

#[test]
fn default_html_binding_rebuilds_pages_on_partial_edits() -> TestResult {
    let cfg = ConfigFile::try_from(default_raw_config())?;
    let profiles = build_profiles_from_config(&cfg)?;

    let matching = |rel: &str| -> Vec<String> {
        profiles
            .iter()
            .filter(|p| p.matches(rel))
            .map(|p| p.name().to_string())
            .collect()
    };

    assert_eq!(matching("src/partials/header.html"), vec!["html"]);
    assert_eq!(matching("src/index.html"), vec!["html"]);
    assert_eq!(matching("src/css/site.css"), vec!["css"]);
    Ok(())
}

#[test]
fn collect_walks_only_matching_files() -> TestResult {
    let project = Project::new();
    project
        .write("src/css/a.css", "a{}")
        .write("src/css/sub/b.css", "b{}")
        .write("src/css/readme.md", "no");
    let profile = BindingWatchProfile::new("css", &strings(&["src/css/**/*.css"]), &[], true)?;

    let files = collect_matching_files(project.root(), &profile)?;
    assert_eq!(
        files,
        vec![project.path("src/css/a.css"), project.path("src/css/sub/b.css")]
    );
    Ok(())
}

#[tokio::test]
async fn change_triggers_every_matching_binding() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/js/app.js", "var a = 1;\n");

    let profiles = Arc::new(vec![
        BindingWatchProfile::new("scripts", &strings(&["src/js/**/*.js"]), &[], false)?,
        BindingWatchProfile::new("everything", &strings(&["src/**/*"]), &[], false)?,
        BindingWatchProfile::new("styles", &strings(&["src/css/**/*.css"]), &[], false)?,
    ]);
    let ignored = IgnoredDirs::new(["dist", ".git"]);
    let hashes = Arc::new(Mutex::new(MemoryHashStore::new()));
    let (tx, mut rx) = mpsc::channel(16);

    let alive = process_file_change(
        project.root(),
        &project.path("src/js/app.js"),
        &profiles,
        &ignored,
        &tx,
        Arc::clone(&hashes),
    )
    .await;
    assert!(alive);
    assert_eq!(drain(&mut rx), vec!["scripts", "everything"]);
    Ok(())
}

#[tokio::test]
async fn output_root_and_outside_paths_are_ignored() -> TestResult {
    init_tracing();
    let project = Project::new();
    let outside = Project::new();
    outside.write("src/a.css", "a{}");

    let profiles = Arc::new(vec![BindingWatchProfile::new(
        "all",
        &strings(&["**/*"]),
        &[],
        false,
    )?]);
    let ignored = IgnoredDirs::new(["dist"]);
    let hashes = Arc::new(Mutex::new(MemoryHashStore::new()));
    let (tx, mut rx) = mpsc::channel(16);

    for path in [
        project.path("dist/css/site.css"),
        project.path("distillery/x.css"),
        outside.path("src/a.css"),
    ] {
        process_file_change(project.root(), &path, &profiles, &ignored, &tx, Arc::clone(&hashes))
            .await;
    }
    // `distillery` is not inside `dist`.
    assert_eq!(drain(&mut rx), vec!["all"]);
    Ok(())
}

#[tokio::test]
async fn use_hash_skips_unchanged_content() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.write("src/css/a.css", "a{color:red}");
    let path = project.path("src/css/a.css");

    let profiles = Arc::new(vec![BindingWatchProfile::new(
        "styles",
        &strings(&["src/css/**/*.css"]),
        &[],
        true,
    )?]);
    let ignored = IgnoredDirs::default();
    let hashes = Arc::new(Mutex::new(MemoryHashStore::new()));
    let (tx, mut rx) = mpsc::channel(16);

    let change = || {
        process_file_change(project.root(), &path, &profiles, &ignored, &tx, Arc::clone(&hashes))
    };

    change().await;
    assert_eq!(drain(&mut rx), vec!["styles"]);

    // Touched, same bytes.
    project.write("src/css/a.css", "a{color:red}");
    change().await;
    assert!(drain(&mut rx).is_empty());

    project.write("src/css/a.css", "a{color:blue}");
    change().await;
    assert_eq!(drain(&mut rx), vec!["styles"]);
    Ok(())
}

#[tokio::test]
async fn closed_runtime_channel_stops_processing() -> TestResult {
    let project = Project::new();
    let profiles = Arc::new(vec![BindingWatchProfile::new(
        "all",
        &strings(&["src/**"]),
        &[],
        false,
    )?]);
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let alive = process_file_change(
        project.root(),
        &project.path("src/x.js"),
        &profiles,
        &IgnoredDirs::default(),
        &tx,
        Arc::new(Mutex::new(MemoryHashStore::new())),
    )
    .await;
    assert!(!alive);
    Ok(())
}
