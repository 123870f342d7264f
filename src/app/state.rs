//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::MatchRegistry;
use crate::util::rate_limit::{create_limiter, Limiter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub match_registry: Arc<MatchRegistry>,
    pub limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Seeded registries replay the same match seeds run after run
        let match_registry = Arc::new(match config.match_seed {
            Some(seed) => MatchRegistry::seeded(seed),
            None => MatchRegistry::new(),
        });

        let limiter = create_limiter(config.request_rate_limit);

        Self {
            config,
            match_registry,
            limiter,
        }
    }
}
