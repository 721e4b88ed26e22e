use std::{collections::HashMap, time::Instant};

use tokio::sync::{RwLock, mpsc};

// ── Connected channel ────────────────────────────────────────────────────────

/// A WebSocket channel currently connected to the gateway. Deliberately
/// carries no identity: identity is re-derived from the credential inside
/// every message, never cached on the channel.
#[derive(Debug)]
pub struct ConnectedChannel {
    pub conn_id: String,
    /// Serialized frames destined for this channel's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

// ── Gateway state ────────────────────────────────────────────────────────────

pub struct GatewayState {
    pub version: String,
    channels: RwLock<HashMap<String, ConnectedChannel>>,
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_channel(&self, channel: ConnectedChannel) {
        self.channels
            .write()
            .await
            .insert(channel.conn_id.clone(), channel);
    }

    pub async fn remove_channel(&self, conn_id: &str) -> Option<ConnectedChannel> {
        self.channels.write().await.remove(conn_id)
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}
