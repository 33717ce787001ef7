// Payload model and validation
pub mod payload;

// Topic routing
pub mod topic;

// Entity store and change notifications
pub mod state;

// Point-in-time copies of the store
pub mod snapshot;

// Render-ready projection
pub mod projection;

// Configuration
pub mod config;

// Live feed adapter
pub mod feed;

// HTTP and WebSocket APIs
pub mod api;

// Subscription management
pub mod subscription;
