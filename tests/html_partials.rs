// tests/html_partials.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{Project, TestResult, init_tracing, orchestrator, with_timeout};

use assetpipe::transform::{PartialError, PartialResolver, collapse_whitespace};
use assetpipe::types::{BuildMode, TaskKind};

fn resolver(project: &Project) -> PartialResolver {
    PartialResolver::new(Some(project.path("partials"))).expect("patterns compile")
}

#[test]
fn comment_markers_inline_nested_partials() -> TestResult {
    let project = Project::new();
    project
        .write("partials/header.html", "<header><!--partial:logo.html--></header>")
        .write("partials/logo.html", "<img src=\"logo.svg\">");

    let out = resolver(&project).resolve(
        "<body><!-- partial: header.html --><main></main></body>",
        &project.path("index.html"),
    )?;
    assert_eq!(
        out,
        "<body><header><img src=\"logo.svg\"></header><main></main></body>"
    );
    Ok(())
}

#[test]
fn partial_tags_fill_placeholders() -> TestResult {
    let project = Project::new();
    project.write("partials/card.html", "<h2>@@title</h2><p>@@body @@unknown</p>");

    let out = resolver(&project).resolve(
        r#"<partial src="card.html" title="Hello" body='World'></partial>"#,
        &project.path("index.html"),
    )?;
    assert_eq!(out, "<h2>Hello</h2><p>World @@unknown</p>");
    Ok(())
}

#[test]
fn missing_partial_is_an_error() {
    let project = Project::new();
    project.write("partials/.keep", "");

    let err = resolver(&project)
        .resolve("<!--partial:nope.html-->", &project.path("index.html"))
        .unwrap_err();
    assert!(matches!(err, PartialError::Missing { ref name, .. } if name == "nope.html"));
}

#[test]
fn partials_cannot_reach_outside_their_directory() {
    let project = Project::new();
    project
        .write("partials/ok.html", "ok")
        .write("secret.html", "secret");
    let resolver = resolver(&project);
    let page = project.path("index.html");

    for include in [
        "<!--partial:../secret.html-->",
        "<!--partial:nested/../../secret.html-->",
        r#"<partial src="../secret.html"></partial>"#,
    ] {
        let err = resolver.resolve(include, &page).unwrap_err();
        assert!(matches!(err, PartialError::OutsideDir { .. }), "{include}: {err:?}");
    }

    assert_eq!(resolver.resolve("<!--partial:./sub/../ok.html-->", &page).unwrap(), "ok");
}

#[test]
fn include_cycle_is_an_error() {
    let project = Project::new();
    project
        .write("partials/a.html", "<!--partial:b.html-->")
        .write("partials/b.html", "<!--partial:a.html-->");

    let err = resolver(&project)
        .resolve("<!--partial:a.html-->", &project.path("index.html"))
        .unwrap_err();
    assert!(matches!(err, PartialError::Cycle(_)), "{err:?}");
}

#[test]
fn partial_tag_without_src_is_an_error() {
    let project = Project::new();
    let err = resolver(&project)
        .resolve("<partial title=\"x\"></partial>", &project.path("index.html"))
        .unwrap_err();
    assert!(matches!(err, PartialError::MissingSrc(_)), "{err:?}");
}

#[test]
fn includes_without_partials_dir_are_rejected() {
    let resolver = PartialResolver::new(None).expect("patterns compile");
    let err = resolver
        .resolve("<!--partial:x.html-->", std::path::Path::new("index.html"))
        .unwrap_err();
    assert!(matches!(err, PartialError::NoPartialsDir { .. }), "{err:?}");

    // Pages without includes pass through untouched.
    let page = "<p>plain</p>\n";
    assert_eq!(resolver.resolve(page, std::path::Path::new("index.html")).unwrap(), page);
}

#[test]
fn collapse_keeps_inline_spacing_and_raw_content() {
    let html = "<div>\n    <p>Hello   <b>big</b>\n  world</p>\n</div>\n<pre>  keep\n   me </pre>";
    assert_eq!(
        collapse_whitespace(html),
        "<div><p>Hello <b>big</b> world</p></div><pre>  keep\n   me </pre>"
    );
}

#[tokio::test]
async fn html_task_renders_pages_and_collapses_in_production() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("src/index.html", "<body>\n  <!--partial:nav.html-->\n</body>\n")
        .write("src/about/team.html", "<p>team</p>\n")
        .write("src/partials/nav.html", "<nav>\n  <a href=\"/\">home</a>\n</nav>");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "html",
            TaskConfigBuilder::transform(TaskKind::Html, "src/**/*.html", "dist")
                .exclude("src/partials/**")
                .partials("src/partials")
                .build(),
        )
        .build();

    let dev = orchestrator(&project, cfg.clone(), BuildMode::Development);
    with_timeout(dev.run_named("html")).await?;
    assert_eq!(project.files_under("dist"), vec!["about/team.html", "index.html"]);
    assert_eq!(
        project.read("dist/index.html"),
        "<body>\n  <nav>\n  <a href=\"/\">home</a>\n</nav>\n</body>\n"
    );

    let prod = orchestrator(&project, cfg, BuildMode::Production);
    with_timeout(prod.run_named("html")).await?;
    assert_eq!(
        project.read("dist/index.html"),
        "<body><nav><a href=\"/\">home</a></nav></body>"
    );
    Ok(())
}

#[tokio::test]
async fn page_with_missing_partial_fails_alone() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("src/good.html", "<p>ok</p>")
        .write("src/bad.html", "<!--partial:gone.html-->")
        .write("src/partials/.keep", "");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "html",
            TaskConfigBuilder::transform(TaskKind::Html, "src/*.html", "dist")
                .partials("src/partials")
                .build(),
        )
        .build();
    let orch = orchestrator(&project, cfg, BuildMode::Development);

    let summary = with_timeout(orch.run_named("html")).await?;
    let report = summary.report("html").expect("html report");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("gone.html"));
    assert!(project.exists("dist/good.html"));
    assert!(!project.exists("dist/bad.html"));
    Ok(())
}
