//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::room::RoomRegistry;
use crate::store::BestTimeStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub best_times: BestTimeStore,
    pub rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let best_times = BestTimeStore::open(config.best_time_path.clone());
        let rooms = Arc::new(RoomRegistry::new(best_times.clone()));

        Self {
            config,
            best_times,
            rooms,
        }
    }
}
