// ABOUTME: Push-mode live log connection over a websocket.
// ABOUTME: One connection per deployment run, closed idempotently from any exit path.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error};

use super::client::LogSink;
use super::error::ApiError;
use super::types::LogEntry;

/// Wire shape of one live log frame.
#[derive(Debug, Deserialize)]
struct LiveLogFrame {
    ts: chrono::DateTime<chrono::Utc>,
    line: String,
}

/// Handle to an open live log connection.
///
/// `close` may be called any number of times; only the first does work.
/// Dropping an unclosed handle abandons the reader task without blocking.
#[derive(Debug)]
pub struct LiveLogsHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveLogsHandle {
    /// A handle with no connection behind it. Closing it is a no-op.
    /// Useful for tests and for API fakes.
    pub fn detached() -> Self {
        Self {
            shutdown: None,
            task: None,
        }
    }

    /// Close the connection and wait for the reader task to finish.
    pub async fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may have ended on its own; a dead receiver is fine.
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            debug!("live log reader task ended abnormally: {e}");
        }
    }
}

/// Build the websocket URL for a live log token.
pub(crate) fn live_logs_url(jwt: &str) -> String {
    match std::env::var("SHIPWATCH_WS_URL") {
        Ok(host) => host,
        Err(_) => format!("wss://api.pages.cloudflare.com/logs/ws/get?startIndex=0&jwt={jwt}"),
    }
}

/// Connect and start delivering frames into `on_log`.
///
/// Connecting itself failing is an error; anything that happens after a
/// successful open (parse failures, remote close) is logged at diagnostic
/// level and never aborts the orchestration.
pub(crate) async fn connect(url: &str, on_log: LogSink) -> Result<LiveLogsHandle, ApiError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| ApiError::LiveLogs(e.to_string()))?;

    debug!("live log connection opened");

    let (mut writer, mut reader) = stream.split();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    let _ = writer.send(Message::Close(None)).await;
                    debug!("live log connection closed by us");
                    break;
                }
                message = reader.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => deliver(&text, &on_log),
                        Some(Ok(Message::Close(frame))) => {
                            debug!("live log connection closed by remote: {frame:?}");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!("live log stream error: {e}");
                            break;
                        }
                        None => {
                            debug!("live log stream ended");
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok(LiveLogsHandle {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}

fn deliver(text: &str, on_log: &LogSink) {
    match serde_json::from_str::<LiveLogFrame>(text) {
        Ok(frame) => on_log(LogEntry {
            timestamp: frame.ts,
            message: frame.line,
        }),
        Err(e) => error!("unparseable live log frame: {e}: {text}"),
    }
}
