use std::sync::Arc;

use tokio::time::Duration;

use crate::engine::lifecycle::BookingEngine;
use crate::notifier::ChangeNotifier;
use crate::observability::metrics::Metrics;
use crate::store::backend::Backend;
use crate::store::memory::MemoryBackend;

pub struct AppState {
    pub engine: BookingEngine,
    pub notifier: ChangeNotifier,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn Backend>,
        event_buffer_size: usize,
        persistence_timeout: Duration,
    ) -> Self {
        let metrics = Metrics::new();
        let notifier = ChangeNotifier::new(event_buffer_size, metrics.clone());
        let engine = BookingEngine::new(
            backend,
            notifier.clone(),
            metrics.clone(),
            persistence_timeout,
        );

        Self {
            engine,
            notifier,
            metrics,
        }
    }

    pub fn in_memory(event_buffer_size: usize, persistence_timeout: Duration) -> (Self, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let state = Self::new(backend.clone(), event_buffer_size, persistence_timeout);
        (state, backend)
    }
}
