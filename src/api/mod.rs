// HTTP and WebSocket APIs

pub mod admin;
pub mod query;
pub mod websocket;

pub use admin::{create_admin_router, AdminAppState};
pub use query::{create_query_router, ApiError, QueryAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};
