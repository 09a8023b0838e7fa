// ============================
// crates/backend-lib/src/connection.rs
// ============================
//! Outbound connection handles.

use craftchat_common::ServerEvent;
use tokio::sync::mpsc;

/// Handle addressing one connected client.
///
/// Sends are fire-and-forget: a dropped receiver means the socket is gone
/// and the event is discarded. The unbounded channel keeps `send` free of
/// await points, so it is safe to call while the registry lock is held.
#[derive(Debug, Clone)]
pub struct Connection {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    /// Create a connection handle plus the receiving half the transport
    /// layer drains into the socket.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: ServerEvent) {
        let _ = self.tx.send(event);
    }

    /// Whether two handles address the same underlying connection. Used to
    /// find the identity owning a dropped socket without a separate index.
    pub fn same_channel(&self, other: &Connection) -> bool {
        self.tx.same_channel(&other.tx)
    }
}
