//! Room management - codes, registry, and the per-room session task

pub mod code;
pub mod registry;
pub mod session;

pub use registry::{RoomCmd, RoomHandle, RoomRegistry};
