// WebSocket subscription management

pub mod manager;
pub mod protocol;

pub use manager::{ConnectionManager, StoreChannels};
pub use protocol::{ClientMessage, FieldUpdateMessage};
