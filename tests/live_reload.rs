// tests/live_reload.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{Project, TestResult, init_tracing, orchestrator_with_reload, with_timeout};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use futures_util::StreamExt;
use tower::ServiceExt;

use assetpipe::server::http::{CLIENT_PATH, EVENTS_PATH, inject_client};
use assetpipe::server::{LiveReload, ReloadEvent, ServerState, create_router};
use assetpipe::types::{BuildMode, ReloadKind, TaskKind};

const CLIENT_TAG: &str = "<script src=\"/__assetpipe/client.js\"></script>";

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(body: Body) -> String {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[test]
fn client_goes_before_the_last_body_tag() {
    assert_eq!(
        inject_client("<html><BODY><p>x</p></BODY></html>"),
        format!("<html><BODY><p>x</p>{CLIENT_TAG}</BODY></html>")
    );
    assert_eq!(inject_client("<p>fragment</p>"), format!("<p>fragment</p>{CLIENT_TAG}"));
}

#[tokio::test]
async fn html_pages_get_the_client_and_assets_do_not() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("dist/index.html", "<body><h1>home</h1></body>")
        .write("dist/docs/index.html", "<body>docs</body>")
        .write("dist/css/site.css", "body{color:red}");
    let app = create_router(ServerState::new(project.path("dist"), LiveReload::new()));

    let res = app.clone().oneshot(get("/")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_text(res.into_body()).await,
        format!("<body><h1>home</h1>{CLIENT_TAG}</body>")
    );

    let res = app.clone().oneshot(get("/docs/")).await?;
    assert_eq!(body_text(res.into_body()).await, format!("<body>docs{CLIENT_TAG}</body>"));

    let res = app.clone().oneshot(get("/css/site.css")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res.into_body()).await, "body{color:red}");

    let res = app.clone().oneshot(get("/missing.html")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn client_script_is_served() -> TestResult {
    let project = Project::new();
    let app = create_router(ServerState::new(project.root(), LiveReload::new()));

    let res = app.oneshot(get(CLIENT_PATH)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/javascript"));
    assert!(body_text(res.into_body()).await.contains(EVENTS_PATH));
    Ok(())
}

#[tokio::test]
async fn event_stream_forwards_notifications() -> TestResult {
    init_tracing();
    let project = Project::new();
    let reload = LiveReload::new();
    let app = create_router(ServerState::new(project.root(), reload.clone()));

    let res = app.oneshot(get(EVENTS_PATH)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let mut frames = res.into_body().into_data_stream();

    let hello = with_timeout(frames.next()).await.expect("hello frame")?;
    assert!(String::from_utf8(hello.to_vec())?.contains("connected"));

    reload.notify("css", ReloadKind::Inject);
    let frame = with_timeout(frames.next()).await.expect("inject frame")?;
    let text = String::from_utf8(frame.to_vec())?;
    assert!(text.contains("event: inject"), "{text}");
    assert!(text.contains("data: css"), "{text}");

    reload.error("html", "partial 'x' not found");
    let frame = with_timeout(frames.next()).await.expect("error frame")?;
    let text = String::from_utf8(frame.to_vec())?;
    assert!(text.contains("event: build-error"), "{text}");
    assert!(text.contains("data: html: partial 'x' not found"), "{text}");
    Ok(())
}

#[test]
fn notify_maps_reload_kinds() {
    let reload = LiveReload::new();
    let mut rx = reload.subscribe();

    reload.notify("css", ReloadKind::Inject);
    reload.notify("clean", ReloadKind::None);
    reload.notify("js", ReloadKind::Reload);

    assert_eq!(rx.try_recv().unwrap(), ReloadEvent::Inject { task: "css".into() });
    assert_eq!(rx.try_recv().unwrap(), ReloadEvent::Reload { task: "js".into() });
    assert!(rx.try_recv().is_err());

    // Nobody listening is fine.
    LiveReload::new().notify("css", ReloadKind::Reload);
}

#[tokio::test]
async fn tasks_signal_browsers_after_writing() -> TestResult {
    init_tracing();
    let project = Project::new();
    project
        .write("src/css/site.css", "a { color: red }")
        .write("src/img/logo.svg", "<svg/>");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::transform(TaskKind::Css, "src/css/*.css", "dist/css").build(),
        )
        .with_task(
            "images",
            TaskConfigBuilder::transform(TaskKind::Copy, "src/img/*", "dist/img")
                .reload(ReloadKind::None)
                .build(),
        )
        .with_task(
            "pages",
            TaskConfigBuilder::transform(TaskKind::Html, "src/pages/*.html", "dist").build(),
        )
        .build();

    let reload = LiveReload::new();
    let mut rx = reload.subscribe();
    let orch = orchestrator_with_reload(&project, cfg, BuildMode::Development, reload);

    with_timeout(orch.run_named("css")).await?;
    with_timeout(orch.run_named("images")).await?;
    assert_eq!(rx.try_recv()?, ReloadEvent::Inject { task: "css".into() });
    assert!(rx.try_recv().is_err());

    // A fatal error reaches the browser as well.
    assert!(with_timeout(orch.run_named("pages")).await.is_err());
    match rx.try_recv()? {
        ReloadEvent::Error { task, .. } => assert_eq!(task, "pages"),
        other => panic!("unexpected event: {other:?}"),
    }
    Ok(())
}
