use anyhow::{Context, Result};
use async_nats::jetstream::{self, stream};
use async_nats::{ConnectOptions, Event};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Feed connection configuration
#[derive(Clone, Debug, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Subject filter covering every building topic
    #[serde(default = "default_subject")]
    pub subject: String,
    /// JetStream stream holding the last message of every building subject
    #[serde(default = "default_stream_name")]
    pub stream_name: String,
    /// Clear the store and replay retained state when the connection comes
    /// back after a drop
    #[serde(default = "default_reset_on_reconnect")]
    pub reset_on_reconnect: bool,
}

fn default_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn default_subject() -> String {
    "dom.bldg.>".to_string()
}

fn default_stream_name() -> String {
    "DOM_BLDG".to_string()
}

fn default_reset_on_reconnect() -> bool {
    true
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            subject: default_subject(),
            stream_name: default_stream_name(),
            reset_on_reconnect: default_reset_on_reconnect(),
        }
    }
}

/// Connection state change reported by the client
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

/// Connected feed client plus its connection event stream
pub struct FeedClient {
    jetstream: jetstream::Context,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    config: FeedConfig,
}

impl FeedClient {
    /// Connect to the feed broker and make sure the retaining stream exists
    pub async fn connect(config: FeedConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to feed");

        let (event_tx, events) = mpsc::unbounded_channel();

        let client = ConnectOptions::new()
            .name("landmark")
            .event_callback(move |event| {
                let event_tx = event_tx.clone();
                async move {
                    let event = match event {
                        Event::Connected => ConnectionEvent::Connected,
                        Event::Disconnected => ConnectionEvent::Disconnected,
                        other => {
                            warn!(event = ?other, "Feed connection event");
                            return;
                        }
                    };
                    // Receiver gone means the feed loop has stopped
                    let _ = event_tx.send(event);
                }
            })
            .connect(&config.url)
            .await
            .context("Failed to connect to feed")?;

        info!(url = %config.url, "Connected to feed");

        let feed = Self {
            jetstream: jetstream::new(client),
            events,
            config,
        };

        feed.ensure_stream().await?;

        Ok(feed)
    }

    /// Ensure the stream exists, keeping one message per subject.
    ///
    /// Publishers send location and name once; the stream plays the part of
    /// retained messages so late subscribers still see them.
    async fn ensure_stream(&self) -> Result<()> {
        if self.jetstream.get_stream(&self.config.stream_name).await.is_ok() {
            info!(stream = %self.config.stream_name, "Feed stream already exists");
            return Ok(());
        }

        let stream_config = stream::Config {
            name: self.config.stream_name.clone(),
            subjects: vec![self.config.subject.clone()],
            max_messages_per_subject: 1,
            storage: stream::StorageType::File,
            retention: stream::RetentionPolicy::Limits,
            ..Default::default()
        };

        self.jetstream
            .create_stream(stream_config)
            .await
            .with_context(|| {
                format!("Failed to create feed stream '{}'", self.config.stream_name)
            })?;

        info!(stream = %self.config.stream_name, "Created feed stream");
        Ok(())
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        jetstream::Context,
        mpsc::UnboundedReceiver<ConnectionEvent>,
        FeedConfig,
    ) {
        (self.jetstream, self.events, self.config)
    }
}
