use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::metrics::MonitorMetrics;
use crate::monitor::Monitor;
use crate::probe::StoreInstrumentation;

#[derive(Clone)]
pub struct ApiState {
    metrics: Arc<MonitorMetrics>,
    monitor: Option<Monitor>,
    instruments: Option<StoreInstrumentation>,
    ready: Arc<AtomicBool>,
}

impl ApiState {
    pub fn new(metrics: Arc<MonitorMetrics>) -> Self {
        Self {
            metrics,
            monitor: None,
            instruments: None,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_instruments(mut self, instruments: StoreInstrumentation) -> Self {
        self.instruments = Some(instruments);
        self
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.metrics
    }

    pub fn monitor(&self) -> Option<&Monitor> {
        self.monitor.as_ref()
    }

    pub fn instruments(&self) -> Option<&StoreInstrumentation> {
        self.instruments.as_ref()
    }

    pub fn set_ready(&self, v: bool) {
        self.ready.store(v, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }
}
