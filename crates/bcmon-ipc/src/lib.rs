//! bcmon IPC - mpv JSON IPC host adapter
//!
//! Connects a [`Session`] to a running mpv instance through its
//! `--input-ipc-server` socket (unix socket or windows named pipe). All engine
//! work happens on the connection task; nothing here needs locks.
//!
//! Key bindings reach the session as `script-message` commands, e.g. in
//! `input.conf`:
//!
//! ```text
//! Alt+1 script-message pair:1
//! Alt+l script-message toggleLoudness
//! Alt+t script-message cycleDisplayMode
//! ```

pub mod host;
pub mod protocol;

use bcmon_core::config::AppConfig;
use bcmon_core::host::HostEvent;
use bcmon_core::Session;
use host::MpvHost;
use protocol::Inbound;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("Failed to connect to mpv at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IPC connection error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why [`run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// mpv sent `shutdown`
    Shutdown,
    /// The connection was closed
    Closed,
}

/// Connect to the mpv IPC socket at `path` and run until it goes away
pub async fn run_socket(path: &Path, config: &AppConfig) -> anyhow::Result<Disconnect> {
    tracing::info!(path = %path.display(), "Connecting to mpv");
    let stream = connect(path).await?;
    run(stream, config).await
}

#[cfg(unix)]
async fn connect(path: &Path) -> Result<tokio::net::UnixStream, IpcError> {
    tokio::net::UnixStream::connect(path)
        .await
        .map_err(|source| IpcError::Connect {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(windows)]
async fn connect(
    path: &Path,
) -> Result<tokio::net::windows::named_pipe::NamedPipeClient, IpcError> {
    tokio::net::windows::named_pipe::ClientOptions::new()
        .open(path)
        .map_err(|source| IpcError::Connect {
            path: path.to_path_buf(),
            source,
        })
}

/// Drive a session over an established IPC stream
///
/// Lines that are already readable are processed before due timers fire, so
/// a burst of property changes collapses into one deferred render.
pub async fn run<S>(stream: S, config: &AppConfig) -> anyhow::Result<Disconnect>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut host = MpvHost::new();
    let mut session = Session::new(config);

    host.observe_properties();
    flush(&mut host, &mut writer).await?;
    tracing::info!("Connected to mpv");

    loop {
        let deadline = host.next_deadline();
        tokio::select! {
            biased;

            line = lines.next_line() => {
                let Some(line) = line.map_err(IpcError::from)? else {
                    tracing::info!("mpv closed the connection");
                    return Ok(Disconnect::Closed);
                };
                if handle_line(&mut host, &mut session, &line) {
                    flush(&mut host, &mut writer).await?;
                    tracing::info!("mpv is shutting down");
                    return Ok(Disconnect::Shutdown);
                }
            }
            _ = sleep_until(deadline), if deadline.is_some() => {
                for id in host.take_due_timers(Instant::now()) {
                    session.on_timer(&mut host, id);
                }
            }
        }

        flush(&mut host, &mut writer).await?;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(deadline).await;
    }
}

/// Process one incoming line; returns true on shutdown
fn handle_line(host: &mut MpvHost, session: &mut Session, line: &str) -> bool {
    let message = match Inbound::parse(line) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, line, "Ignoring unparseable IPC line");
            return false;
        }
    };

    match message {
        Inbound::PropertyChange { name, data } => {
            if let Some(event) = host.apply_property(&name, &data) {
                session.handle_event(host, event);
            }
        }
        Inbound::FileLoaded => session.handle_event(host, HostEvent::FileLoaded),
        Inbound::EndFile { reason } => {
            tracing::debug!(reason = ?reason, "end_file");
            session.handle_event(host, HostEvent::EndFile);
        }
        Inbound::ClientMessage(args) => {
            for arg in &args {
                session.dispatch(host, arg);
            }
        }
        Inbound::Shutdown => {
            session.handle_event(host, HostEvent::EndFile);
            return true;
        }
        Inbound::Reply { request_id, error } => {
            if error != "success" {
                tracing::debug!(request_id = ?request_id, error, "mpv rejected request");
            }
        }
        Inbound::Other(event) => tracing::trace!(event, "ignored_event"),
    }
    false
}

async fn flush<W>(host: &mut MpvHost, writer: &mut W) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
{
    let outbox = host.take_outbox();
    if outbox.is_empty() {
        return Ok(());
    }
    for line in outbox {
        writer.write_all(line.as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}
