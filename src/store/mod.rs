//! Persistence - the best-time store

pub mod best_time;

pub use best_time::BestTimeStore;
