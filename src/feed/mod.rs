// Live feed adapter: broker subscription into the entity store

mod client;
mod subscriber;

pub use client::{ConnectionEvent, FeedClient, FeedConfig};
pub use subscriber::{
    consume, handle_message, run_feed, subject_to_topic, Discontinuity, FeedMessage, FeedStream,
};
