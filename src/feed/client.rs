//! Feed client for following a running session.

use crate::error::{LivecapError, Result};
use crate::feed::protocol::FeedEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

/// Connect to a feed server and invoke `on_event` for every event until the
/// server closes the connection.
pub async fn follow<F>(addr: &str, mut on_event: F) -> Result<()>
where
    F: FnMut(FeedEvent),
{
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| LivecapError::FeedConnection {
            message: format!("Failed to connect to {}: {}", addr, e),
        })?;

    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| LivecapError::FeedConnection {
            message: format!("Failed to read from feed: {}", e),
        })?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = FeedEvent::from_json(line).map_err(|e| LivecapError::FeedProtocol {
            message: format!("Failed to parse event: {}", e),
        })?;
        on_event(event);
    }

    Ok(())
}
