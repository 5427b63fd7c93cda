//! Optional observer for admission outcomes.
//!
//! Embedders that export metrics install an [`AdmissionMetrics`] recorder
//! once at startup; without one, the checks pay only for an uncontended
//! read lock.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use crate::error::AdmissionError;

/// Metrics observer for admission checks.
pub trait AdmissionMetrics: Send + Sync {
    fn record_upload_check(&self, latency: Duration, result: Result<(), &AdmissionError>);
    fn record_content_check(&self, latency: Duration, result: Result<(), &AdmissionError>);
}

/// Install or clear the global admission metrics recorder.
pub fn set_admission_metrics(recorder: Option<Arc<dyn AdmissionMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn AdmissionMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn AdmissionMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn AdmissionMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn AdmissionMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_upload(self, result: Result<(), &AdmissionError>) {
        self.recorder
            .record_upload_check(self.start.elapsed(), result);
    }

    pub(crate) fn record_content(self, result: Result<(), &AdmissionError>) {
        self.recorder
            .record_content_check(self.start.elapsed(), result);
    }
}
