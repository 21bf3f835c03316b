//! WebSocket layer: the live audit feed.
//!
//! The endpoint at `/ws` streams audit events for the cases a client
//! subscribes to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
