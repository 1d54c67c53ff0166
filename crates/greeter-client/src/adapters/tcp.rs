//! # TCP Transport
//!
//! Carries `SayHello` calls over a single TCP connection using the
//! newline-delimited JSON framing from `shared_types::wire`.
//!
//! ## Connection Model
//!
//! - One connection per transport, opened lazily by the first call.
//! - Any number of calls may be outstanding on the connection; each request
//!   frame gets a connection-local `id` and the reader task routes replies
//!   back by that `id`, in whatever order the peer answers.
//! - If the connection is lost, every outstanding call and every later call
//!   completes with `UNAVAILABLE`. There is no reconnect or retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, OnceCell};
use tracing::{debug, warn};

use shared_types::wire::{decode_line, encode_line};
use shared_types::{HelloReply, HelloRequest, RpcStatus, WireRequest, WireResponse};

use crate::ports::GreeterTransport;

type Outcome = Result<HelloReply, RpcStatus>;

/// Calls waiting for a reply, keyed by wire id. `None` once the connection
/// is gone, so late registrations fail instead of waiting forever.
type PendingReplies = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<Outcome>>>>>;

/// Transport over one lazily established TCP connection.
pub struct TcpTransport {
    target: String,
    connection: OnceCell<Connection>,
}

impl TcpTransport {
    /// Transport to `target` (`host:port`). Does not connect.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection, RpcStatus> {
        self.connection
            .get_or_try_init(|| Connection::open(&self.target))
            .await
    }
}

#[async_trait]
impl GreeterTransport for TcpTransport {
    async fn say_hello(&self, request: HelloRequest) -> Result<HelloReply, RpcStatus> {
        let connection = self.connection().await?;
        connection.call(request).await
    }

    fn target(&self) -> &str {
        &self.target
    }
}

/// An open connection with its reader and writer tasks.
struct Connection {
    outbound: mpsc::UnboundedSender<WireRequest>,
    pending: PendingReplies,
    next_id: AtomicU64,
}

impl Connection {
    async fn open(target: &str) -> Result<Self, RpcStatus> {
        let stream = TcpStream::connect(target).await.map_err(|e| {
            warn!(peer = target, error = %e, "Connect failed");
            RpcStatus::unavailable(format!("failed to connect to {target}: {e}"))
        })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = target, error = %e, "Could not set TCP_NODELAY");
        }

        let (read_half, write_half) = stream.into_split();
        let (outbound, requests) = mpsc::unbounded_channel();
        let pending: PendingReplies = Arc::new(Mutex::new(Some(HashMap::new())));

        tokio::spawn(write_loop(write_half, requests, Arc::clone(&pending)));
        tokio::spawn(read_loop(read_half, Arc::clone(&pending)));

        debug!(peer = target, "Connection established");
        Ok(Self {
            outbound,
            pending,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, request: HelloRequest) -> Outcome {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();

        match self.pending.lock().as_mut() {
            Some(waiting) => {
                waiting.insert(id, reply_tx);
            }
            None => return Err(RpcStatus::unavailable("connection closed")),
        }

        if self.outbound.send(WireRequest { id, request }).is_err() {
            if let Some(waiting) = self.pending.lock().as_mut() {
                waiting.remove(&id);
            }
            return Err(RpcStatus::unavailable("connection writer stopped"));
        }

        reply_rx
            .await
            .unwrap_or_else(|_| Err(RpcStatus::unavailable("connection dropped")))
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut requests: mpsc::UnboundedReceiver<WireRequest>,
    pending: PendingReplies,
) {
    while let Some(frame) = requests.recv().await {
        let bytes = match encode_line(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                complete_one(&pending, frame.id, Err(RpcStatus::internal(e.to_string())));
                continue;
            }
        };
        if let Err(e) = writer.write_all(&bytes).await {
            warn!(error = %e, "Write failed; failing outstanding calls");
            fail_all(&pending, &format!("write failed: {e}"));
            return;
        }
    }
}

async fn read_loop(reader: OwnedReadHalf, pending: PendingReplies) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match decode_line::<WireResponse>(&line) {
                Ok(response) => {
                    let id = response.id;
                    complete_one(&pending, id, response.into_outcome());
                }
                Err(e) => warn!(error = %e, "Discarding malformed response frame"),
            },
            Ok(None) => {
                debug!("Connection closed by peer");
                fail_all(&pending, "connection closed by peer");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Read failed; failing outstanding calls");
                fail_all(&pending, &format!("read failed: {e}"));
                return;
            }
        }
    }
}

fn complete_one(pending: &PendingReplies, id: u64, outcome: Outcome) {
    let waiter = pending.lock().as_mut().and_then(|waiting| waiting.remove(&id));
    match waiter {
        // The caller may have gone away; nothing to deliver to.
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => warn!(id, "Response for unknown call id"),
    }
}

fn fail_all(pending: &PendingReplies, reason: &str) {
    let waiting = pending.lock().take().unwrap_or_default();
    for (_, tx) in waiting {
        let _ = tx.send(Err(RpcStatus::unavailable(reason)));
    }
}
