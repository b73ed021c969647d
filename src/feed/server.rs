//! Async TCP server pushing transcript events to connected clients.

use crate::error::{LivecapError, Result};
use crate::feed::protocol::FeedEvent;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};

/// How many events a slow client may fall behind before it skips ahead.
const EVENT_BUFFER: usize = 64;

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// Feed server broadcasting transcript events to any number of clients.
///
/// The aggregator thread publishes through the broadcast sender (a sync
/// `send`, no await); each client connection gets its own receiver. A
/// lagging client skips missed events; every `phrase` event carries the
/// full transcript, so skipping never loses state, only intermediate
/// guesses.
pub struct FeedServer {
    addr: SocketAddr,
    events: broadcast::Sender<FeedEvent>,
    state: ServerState,
}

impl FeedServer {
    /// Create a feed server bound to nothing yet; `start` binds.
    pub fn new(addr: SocketAddr) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            addr,
            events,
            state: ServerState::new(),
        }
    }

    /// The event sender for sinks to publish into.
    pub fn events(&self) -> broadcast::Sender<FeedEvent> {
        self.events.clone()
    }

    /// The configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept connections until stopped.
    pub async fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| LivecapError::FeedSocket {
                message: format!("Failed to bind {}: {}", self.addr, e),
            })?;

        loop {
            if self.state.is_shutdown().await {
                break;
            }

            // Accept with timeout so the shutdown flag is checked regularly
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let rx = self.events.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, rx).await {
                            eprintln!("livecap: feed client error: {}", e);
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(LivecapError::FeedConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    // Timeout - check shutdown flag again
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop accepting connections. Existing clients are dropped when the
    /// event sender goes away.
    pub async fn stop(&self) {
        self.state.set_shutdown().await;
    }
}

/// Stream events to a single client until it disconnects.
async fn handle_client(
    mut stream: TcpStream,
    mut rx: broadcast::Receiver<FeedEvent>,
) -> Result<()> {
    let hello = FeedEvent::Hello {
        version: crate::version_string(),
    };
    write_event(&mut stream, &hello).await?;

    loop {
        match rx.recv().await {
            Ok(event) => {
                if write_event(&mut stream, &event).await.is_err() {
                    // Client went away; not an error worth reporting
                    return Ok(());
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => {
                // Skip ahead; the next phrase event carries the full transcript
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

async fn write_event(stream: &mut TcpStream, event: &FeedEvent) -> Result<()> {
    let json = event.to_json().map_err(|e| LivecapError::FeedProtocol {
        message: format!("Failed to serialize event: {}", e),
    })?;

    stream
        .write_all(json.as_bytes())
        .await
        .map_err(|e| LivecapError::FeedConnection {
            message: format!("Failed to write to client: {}", e),
        })?;
    stream
        .write_all(b"\n")
        .await
        .map_err(|e| LivecapError::FeedConnection {
            message: format!("Failed to write to client: {}", e),
        })?;
    stream
        .flush()
        .await
        .map_err(|e| LivecapError::FeedConnection {
            message: format!("Failed to flush client stream: {}", e),
        })?;
    Ok(())
}
