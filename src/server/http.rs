// src/server/http.rs

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::stream::{self, Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::Result;
use crate::server::{LiveReload, ReloadEvent};

/// Route of the server-sent event stream.
pub const EVENTS_PATH: &str = "/__assetpipe/events";

/// Route of the injected browser client.
pub const CLIENT_PATH: &str = "/__assetpipe/client.js";

const CLIENT_JS: &str = include_str!("client.js");

/// Shared state for the live reload server.
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Directory served at `/` (the output root).
    pub root: Arc<PathBuf>,
    pub reload: LiveReload,
}

impl ServerState {
    pub fn new(root: impl Into<PathBuf>, reload: LiveReload) -> Self {
        Self {
            root: Arc::new(root.into()),
            reload,
        }
    }
}

/// Create the router: the event stream, the client script, and the output
/// root as a static site with the client injected into HTML pages.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(events))
        .route(CLIENT_PATH, get(client_script))
        .fallback(serve_output)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, state: ServerState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("live reload server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("live reload server stopped");
    Ok(())
}

async fn events(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(event_stream(state.reload.subscribe())).keep_alive(KeepAlive::default())
}

fn event_stream(
    receiver: broadcast::Receiver<ReloadEvent>,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> + Send {
    let hello = stream::once(async { Ok::<_, Infallible>(Event::default().comment("connected")) });

    let updates = stream::unfold(receiver, |mut receiver| async move {
        match receiver.recv().await {
            Ok(event) => {
                let sse = Event::default().event(event.name()).data(event.data());
                Some((Ok(sse), receiver))
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "reload stream lagged; forcing a page reload");
                let sse = Event::default().event("reload").data("lagged");
                Some((Ok(sse), receiver))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    });

    hello.chain(updates)
}

async fn client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_JS,
    )
}

/// HTML pages get the client script; everything else goes to `ServeDir`.
async fn serve_output(State(state): State<ServerState>, req: Request) -> Response {
    if req.method() == Method::GET {
        if let Some(path) = html_target(&state.root, req.uri().path()) {
            if let Ok(page) = tokio::fs::read_to_string(&path).await {
                return (
                    [
                        (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                        (header::CACHE_CONTROL, "no-cache"),
                    ],
                    inject_client(&page),
                )
                    .into_response();
            }
        }
    }

    match ServeDir::new(state.root.as_path()).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

/// File an HTML request maps to, or `None` for non-HTML and unsafe paths.
fn html_target(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let rel = uri_path.trim_start_matches('/');
    if rel.split('/').any(|seg| seg == "..") {
        return None;
    }

    let path = root.join(rel);
    if rel.is_empty() || uri_path.ends_with('/') {
        return Some(path.join("index.html"));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
            Some(path)
        }
        _ => None,
    }
}

/// Insert the client `<script>` before the last `</body>`, or append it.
pub fn inject_client(page: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    match page.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(page.len() + tag.len());
            out.push_str(&page[..idx]);
            out.push_str(&tag);
            out.push_str(&page[idx..]);
            out
        }
        None => format!("{page}{tag}"),
    }
}

