//! # Echo Peer
//!
//! A greeter service that answers every request by echoing it back, with
//! optional scripted delays and failures. It speaks the same wire framing as
//! [`TcpTransport`](super::tcp::TcpTransport) and answers each request as
//! soon as its delay elapses, so replies on one connection can overtake
//! each other.

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared_types::wire::{decode_line, encode_line};
use shared_types::{HelloReply, HelloRequest, RpcStatus, WireRequest, WireResponse};

/// How the echo peer treats each sequence number.
#[derive(Debug, Clone, Default)]
pub struct EchoScript {
    default_delay: Duration,
    jitter: Duration,
    delays: HashMap<i64, Duration>,
    failures: HashSet<i64>,
    panics: HashSet<i64>,
}

impl EchoScript {
    /// Answer everything immediately and successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to calls without a specific delay.
    #[must_use]
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Random extra delay in `[0, jitter]` added to every call.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay for one sequence number.
    #[must_use]
    pub fn with_delay(mut self, number: i64, delay: Duration) -> Self {
        self.delays.insert(number, delay);
        self
    }

    /// Fail the call with this sequence number.
    #[must_use]
    pub fn failing(mut self, number: i64) -> Self {
        self.failures.insert(number);
        self
    }

    /// Make an in-process transport panic while serving this sequence number.
    ///
    /// Over TCP the peer answers `INTERNAL` instead.
    #[must_use]
    pub fn panicking(mut self, number: i64) -> Self {
        self.panics.insert(number);
        self
    }

    /// Delay to apply before answering `number`.
    pub fn delay_for(&self, number: i64) -> Duration {
        let base = self
            .delays
            .get(&number)
            .copied()
            .unwrap_or(self.default_delay);
        if self.jitter.is_zero() {
            return base;
        }
        let max = u64::try_from(self.jitter.as_micros()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=max);
        base + Duration::from_micros(extra)
    }

    /// Whether serving `number` should panic.
    pub fn should_panic(&self, number: i64) -> bool {
        self.panics.contains(&number)
    }

    /// The answer for `request`.
    pub fn outcome(&self, request: &HelloRequest) -> Result<HelloReply, RpcStatus> {
        if self.failures.contains(&request.number) {
            Err(RpcStatus::unavailable(format!(
                "scripted failure for call {}",
                request.number
            )))
        } else {
            Ok(HelloReply::echo(request))
        }
    }
}

/// Echo peer listening on a TCP socket.
///
/// Dropping the server stops accepting new connections.
pub struct EchoServer {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl EchoServer {
    /// Bind to `addr` (port `0` picks a free port) and start serving on the
    /// current runtime.
    pub async fn bind(addr: &str, script: EchoScript) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "Echo server listening");

        let accept_task = tokio::spawn(accept_loop(listener, script));
        Ok(Self {
            local_addr,
            accept_task,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the accept loop fails.
    pub async fn wait(mut self) -> io::Result<()> {
        match (&mut self.accept_task).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        }
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, script: EchoScript) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "Accepted connection");
                tokio::spawn(serve_connection(stream, script.clone()));
            }
            Err(e) => {
                warn!(error = %e, "Accept failed; echo server stopping");
                return;
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, script: EchoScript) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Could not set TCP_NODELAY");
    }
    let (read_half, mut write_half) = stream.into_split();
    let (responses, mut outbox) = mpsc::unbounded_channel::<WireResponse>();

    let writer = tokio::spawn(async move {
        while let Some(response) = outbox.recv().await {
            let bytes = match encode_line(&response) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Failed to encode response");
                    continue;
                }
            };
            if write_half.write_all(&bytes).await.is_err() {
                return;
            }
        }
    });

    let mut lines = BufReader::new(read_half).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let frame: WireRequest = match decode_line(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Discarding malformed request frame");
                continue;
            }
        };

        let script = script.clone();
        let responses = responses.clone();
        tokio::spawn(async move {
            let delay = script.delay_for(frame.request.number);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let response = if script.should_panic(frame.request.number) {
                WireResponse::failure(frame.id, RpcStatus::internal("scripted panic"))
            } else {
                match script.outcome(&frame.request) {
                    Ok(reply) => WireResponse::success(frame.id, reply),
                    Err(status) => WireResponse::failure(frame.id, status),
                }
            };
            // The connection may already be gone.
            let _ = responses.send(response);
        });
    }

    drop(responses);
    let _ = writer.await;
    debug!("Connection finished");
}
