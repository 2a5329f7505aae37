// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket listener.
//!
//! Accepts connections and forwards one JSON event per line into the master
//! loop's channel. Malformed lines are logged and dropped; the connection
//! stays open.

use crate::protocol::MasterEvent;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Bind the control socket, replacing any stale socket file.
pub fn bind(path: &Path) -> std::io::Result<UnixListener> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale socket"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    UnixListener::bind(path)
}

/// Accept connections until the event channel closes.
pub async fn run(listener: UnixListener, events: mpsc::Sender<MasterEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                if events.is_closed() {
                    return;
                }
                tokio::spawn(serve(stream, events.clone()));
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
            }
        }
    }
}

async fn serve(stream: UnixStream, events: mpsc::Sender<MasterEvent>) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<MasterEvent>(line) {
                    Ok(event) => {
                        debug!(event = event.name(), "inbound event");
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, "discarding a malformed event line"),
                }
            }
            Ok(None) => return,
            Err(e) => {
                debug!(error = %e, "connection closed");
                return;
            }
        }
    }
}
