use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::adaptive::AdaptiveEngine;
use crate::config::Config;
use crate::matching::catalog::Catalog;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::coach::CareerCoach;
use crate::store::Store;

/// Shared handles for every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    adaptive: Arc<AdaptiveEngine>,
    catalog: Arc<Catalog>,
    coach: Arc<CareerCoach>,
    rate_limit: Arc<RateLimiter>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        adaptive: Arc<AdaptiveEngine>,
        catalog: Arc<Catalog>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let rate_limit = Arc::new(RateLimiter::new(
            config.rate_limit.window_secs,
            config.rate_limit.max_requests,
        ));
        let coach = Arc::new(CareerCoach::new(&config.coach));

        Self {
            store,
            adaptive,
            catalog,
            coach,
            rate_limit,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn adaptive(&self) -> &AdaptiveEngine {
        &self.adaptive
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn coach(&self) -> &CareerCoach {
        &self.coach
    }

    pub fn rate_limit(&self) -> &Arc<RateLimiter> {
        &self.rate_limit
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_tx(&self) -> &broadcast::Sender<()> {
        &self.shutdown_tx
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
