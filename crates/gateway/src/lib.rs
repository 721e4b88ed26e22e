//! HTTP + WebSocket gateway.
//!
//! One WebSocket channel per client. Messages on a channel are processed
//! strictly in order; channels never block each other.

pub mod server;
pub mod state;
pub mod ws;
