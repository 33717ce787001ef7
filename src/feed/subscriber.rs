use crate::feed::client::{ConnectionEvent, FeedClient};
use crate::state::{EntityStore, IngestOutcome};
use anyhow::{Context, Result};
use async_nats::jetstream::consumer::{pull, DeliverPolicy};
use futures::future::Future;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One message as delivered by the feed
#[derive(Clone, Debug, PartialEq)]
pub struct FeedMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

impl FeedMessage {
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

/// Message stream opened by the feed; every open starts with a replay of
/// the last message on each subject
pub type FeedStream = BoxStream<'static, Result<FeedMessage>>;

/// Map a broker subject (`dom.bldg.6.coord`) to a store topic (`dom/bldg/6/coord`).
///
/// Building ids therefore cannot contain `.`; a token containing `/` would
/// shift the topic segments, so such subjects map to `None`.
pub fn subject_to_topic(subject: &str) -> Option<String> {
    if subject.contains('/') {
        return None;
    }
    Some(subject.replace('.', "/"))
}

/// Hand one feed message to the store
pub fn handle_message(store: &EntityStore, subject: &str, payload: &[u8]) -> IngestOutcome {
    let Some(topic) = subject_to_topic(subject) else {
        store.metrics.record_message();
        store.metrics.record_ignored();
        warn!(subject = %subject, "Dropping message on subject with '/' in a token");
        return IngestOutcome::Ignored;
    };
    store.ingest_message(&topic, payload)
}

/// Detects a connection that came back after dropping.
///
/// Messages published while disconnected may be missing, so the store is
/// rebuilt from a fresh replay afterwards.
#[derive(Debug, Default)]
pub struct Discontinuity {
    disconnected: bool,
}

impl Discontinuity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one connection event; true when the store should be reset
    pub fn observe(&mut self, event: ConnectionEvent) -> bool {
        match event {
            ConnectionEvent::Disconnected => {
                self.disconnected = true;
                false
            }
            ConnectionEvent::Connected => std::mem::take(&mut self.disconnected),
        }
    }
}

/// Ingest from streams produced by `open` until the current stream ends.
///
/// After a reconnect following a drop (and with `reset_on_reconnect`), the
/// store is reset and `open` is called again so the replay repopulates it.
pub async fn consume<F, Fut>(
    store: &EntityStore,
    mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    reset_on_reconnect: bool,
    mut open: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<FeedStream>>,
{
    let mut messages = open().await?;
    let mut discontinuity = Discontinuity::new();

    loop {
        tokio::select! {
            // Drain ready messages before acting on connection events
            biased;

            msg = messages.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        handle_message(store, &msg.subject, &msg.payload);
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Error receiving feed message");
                    }
                    None => break,
                }
            }

            Some(event) = events.recv() => {
                match event {
                    ConnectionEvent::Disconnected => warn!("Feed connection lost"),
                    ConnectionEvent::Connected => info!("Feed connection established"),
                }

                if discontinuity.observe(event) && reset_on_reconnect {
                    let cleared = store.reset();
                    messages = open().await?;
                    info!(entities_cleared = cleared, "Store reset after feed reconnect, replaying");
                }
            }
        }
    }

    warn!("Feed subscription ended");
    Ok(())
}

/// Subscribe to the feed and ingest every message until the subscription ends
pub async fn run_feed(store: Arc<EntityStore>, feed: FeedClient) -> Result<()> {
    let (jetstream, events, config) = feed.into_parts();

    info!(
        stream = %config.stream_name,
        subject = %config.subject,
        "Feed subscriber started"
    );

    let open = || {
        let jetstream = jetstream.clone();
        let stream_name = config.stream_name.clone();
        let subject = config.subject.clone();
        async move {
            let stream = jetstream
                .get_stream(&stream_name)
                .await
                .with_context(|| format!("Failed to get feed stream '{}'", stream_name))?;

            // Ephemeral ordered consumer: last message per subject, then live
            let consumer = stream
                .create_consumer(pull::OrderedConfig {
                    filter_subject: subject,
                    deliver_policy: DeliverPolicy::LastPerSubject,
                    ..Default::default()
                })
                .await
                .context("Failed to create feed consumer")?;

            let messages = consumer
                .messages()
                .await
                .context("Failed to open feed message stream")?;

            let messages: FeedStream = messages
                .map(|msg| {
                    msg.map(|msg| FeedMessage::new(msg.subject.to_string(), msg.payload.to_vec()))
                        .map_err(anyhow::Error::from)
                })
                .boxed();
            Ok(messages)
        }
    };

    consume(&store, events, config.reset_on_reconnect, open).await
}
