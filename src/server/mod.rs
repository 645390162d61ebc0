// src/server/mod.rs

//! Live reload: a broadcast handle the tasks notify, and the HTTP server
//! that serves the output root and forwards notifications to browsers.

pub mod http;

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::ReloadKind;

pub use http::{ServerState, create_router, serve};

/// Notification pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Stylesheets changed; swap them in place.
    Inject { task: String },
    /// Anything else changed; reload the page.
    Reload { task: String },
    /// A task reported an error.
    Error { task: String, message: String },
}

impl ReloadEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ReloadEvent::Inject { .. } => "inject",
            ReloadEvent::Reload { .. } => "reload",
            ReloadEvent::Error { .. } => "build-error",
        }
    }

    /// SSE payload. Carriage returns are not allowed in SSE data lines.
    pub fn data(&self) -> String {
        let data = match self {
            ReloadEvent::Inject { task } | ReloadEvent::Reload { task } => task.clone(),
            ReloadEvent::Error { task, message } => format!("{task}: {message}"),
        };
        data.replace('\r', "")
    }
}

const CHANNEL_CAPACITY: usize = 64;

/// Cloneable handle to the reload channel.
///
/// Sending never blocks and never fails: with no browser connected the
/// notification is dropped.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<ReloadEvent>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Signal that `task` produced output.
    pub fn notify(&self, task: &str, kind: ReloadKind) {
        let event = match kind {
            ReloadKind::Inject => ReloadEvent::Inject {
                task: task.to_string(),
            },
            ReloadKind::Reload => ReloadEvent::Reload {
                task: task.to_string(),
            },
            ReloadKind::None => return,
        };
        self.send(event);
    }

    /// Surface a task error to browsers.
    pub fn error(&self, task: &str, message: impl Into<String>) {
        self.send(ReloadEvent::Error {
            task: task.to_string(),
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: ReloadEvent) {
        let receivers = self.tx.send(event.clone()).unwrap_or(0);
        debug!(event = event.name(), receivers, "live reload notification");
    }
}
