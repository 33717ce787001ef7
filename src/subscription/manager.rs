use crate::state::{EntityStore, FieldUpdate, MetricsUpdate, StoreReset, TotalsUpdate};
use crate::subscription::protocol::{
    ClientMessage, ErrorMessage, FieldUpdateMessage, MetricsUpdateMessage, StoreResetMessage,
    TotalsUpdateMessage,
};
use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Broadcast receivers a connection listens on
pub struct StoreChannels {
    pub updates: broadcast::Receiver<FieldUpdate>,
    pub totals: broadcast::Receiver<TotalsUpdate>,
    pub resets: broadcast::Receiver<StoreReset>,
    pub metrics: broadcast::Receiver<MetricsUpdate>,
}

impl StoreChannels {
    pub fn subscribe(store: &EntityStore) -> Self {
        Self {
            updates: store.subscribe(),
            totals: store.subscribe_totals(),
            resets: store.subscribe_resets(),
            metrics: store.subscribe_metrics(),
        }
    }
}

/// Manages a single WebSocket connection with building subscriptions
pub struct ConnectionManager {
    /// Set of building IDs this connection is subscribed to
    subscriptions: HashSet<String>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: HashSet::new(),
        }
    }

    /// Handle WebSocket connection lifecycle
    pub async fn handle(
        mut self,
        mut socket: WebSocket,
        mut channels: StoreChannels,
        store: Arc<EntityStore>,
    ) {
        store.metrics.increment_ws_connection();
        info!("WebSocket connection established");

        loop {
            tokio::select! {
                // Handle incoming client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Err(e) = self.handle_client_message(&text) {
                                warn!(error = %e, "Invalid client message");
                                let reply = ErrorMessage::new(e.to_string());
                                if let Err(e) = send_json(&mut socket, &reply).await {
                                    error!(error = %e, "Failed to send error message");
                                    break;
                                }
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Field updates, filtered by subscription
                result = channels.updates.recv() => {
                    match result {
                        Ok(update) => {
                            if self.should_forward_update(&update) {
                                let msg = FieldUpdateMessage::from(update);
                                if let Err(e) = send_json(&mut socket, &msg).await {
                                    error!(error = %e, "Failed to send field update");
                                    break;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped = skipped, "WebSocket lagged, skipped updates");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("Update broadcast channel closed");
                            break;
                        }
                    }
                }

                result = channels.totals.recv() => {
                    match result {
                        Ok(update) => {
                            let msg = TotalsUpdateMessage::from(update);
                            if let Err(e) = send_json(&mut socket, &msg).await {
                                error!(error = %e, "Failed to send totals update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                result = channels.resets.recv() => {
                    match result {
                        Ok(reset) => {
                            let msg = StoreResetMessage::from(reset);
                            if let Err(e) = send_json(&mut socket, &msg).await {
                                error!(error = %e, "Failed to send store reset");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                result = channels.metrics.recv() => {
                    match result {
                        Ok(update) => {
                            let msg = MetricsUpdateMessage::from(update);
                            if let Err(e) = send_json(&mut socket, &msg).await {
                                error!(error = %e, "Failed to send metrics update");
                                break;
                            }
                        }
                        // Metrics are periodic; a skipped one is harmless
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                else => {
                    break;
                }
            }
        }

        store.metrics.decrement_ws_connection();
        info!("WebSocket connection closed");
    }

    /// Handle client message (subscribe/unsubscribe)
    fn handle_client_message(&mut self, text: &str) -> anyhow::Result<()> {
        let msg: ClientMessage = serde_json::from_str(text)?;

        match msg {
            ClientMessage::Subscribe { entity_id } => {
                info!(entity_id = %entity_id, "Client subscribed to building");
                self.subscriptions.insert(entity_id);
            }
            ClientMessage::Unsubscribe { entity_id } => {
                info!(entity_id = %entity_id, "Client unsubscribed from building");
                self.subscriptions.remove(&entity_id);
            }
        }

        Ok(())
    }

    /// Check if update should be forwarded to this connection
    fn should_forward_update(&self, update: &FieldUpdate) -> bool {
        // If no subscriptions, forward all updates
        if self.subscriptions.is_empty() {
            return true;
        }

        self.subscriptions.contains(&update.entity_id)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, msg: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{FieldKind, FieldValue};
    use chrono::Utc;

    fn update_for(entity_id: &str) -> FieldUpdate {
        FieldUpdate {
            entity_id: entity_id.to_string(),
            kind: FieldKind::DisplayName,
            value: FieldValue::DisplayName(Some("Gym".to_string())),
            discovered: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_no_subscriptions_forwards_everything() {
        let manager = ConnectionManager::new();
        assert!(manager.should_forward_update(&update_for("6")));
        assert!(manager.should_forward_update(&update_for("7")));
    }

    #[test]
    fn test_subscribe_filters_updates() {
        let mut manager = ConnectionManager::new();
        manager
            .handle_client_message(r#"{"type":"subscribe","entity_id":"6"}"#)
            .unwrap();

        assert!(manager.should_forward_update(&update_for("6")));
        assert!(!manager.should_forward_update(&update_for("7")));
    }

    #[test]
    fn test_unsubscribe_restores_firehose() {
        let mut manager = ConnectionManager::new();
        manager
            .handle_client_message(r#"{"type":"subscribe","entity_id":"6"}"#)
            .unwrap();
        manager
            .handle_client_message(r#"{"type":"unsubscribe","entity_id":"6"}"#)
            .unwrap();

        assert!(manager.should_forward_update(&update_for("7")));
    }

    #[test]
    fn test_invalid_client_message() {
        let mut manager = ConnectionManager::new();
        assert!(manager.handle_client_message("not json").is_err());
        assert!(manager.subscriptions.is_empty());
    }
}
