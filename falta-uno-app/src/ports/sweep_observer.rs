use std::sync::{Arc, Mutex};

use crate::workflow::lifecycle::SweepSummary;

pub trait SweepObserverPort {
    fn on_sweep_completed(&self, summary: &SweepSummary);
}

pub struct LogSweepObserver;

impl SweepObserverPort for LogSweepObserver {
    fn on_sweep_completed(&self, summary: &SweepSummary) {
        log::info!(
            "Match lifecycle sweep: processed={} cancelled={} completed={} skipped={}",
            summary.processed,
            summary.cancelled,
            summary.completed,
            summary.skipped
        );
    }
}

#[derive(Clone, Default)]
pub struct RecordingSweepObserver {
    pub summaries: Arc<Mutex<Vec<SweepSummary>>>,
}

impl RecordingSweepObserver {
    pub fn get_summaries(&self) -> Vec<SweepSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

impl SweepObserverPort for RecordingSweepObserver {
    fn on_sweep_completed(&self, summary: &SweepSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}
