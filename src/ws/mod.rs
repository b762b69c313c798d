//! WebSocket transport - protocol types and connection handling

pub mod handler;
pub mod protocol;
