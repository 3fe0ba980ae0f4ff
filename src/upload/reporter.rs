//! Throttle for the best-effort progress reports sent to the backend.

use crate::progress::loaded_percent;

/// Decides which progress events are reported to the backend: only whole
/// percents divisible by `step`, each boundary at most once
#[derive(Debug, Clone)]
pub struct ProgressReportThrottle {
    step: u8,
    last_reported: Option<u8>,
}

impl ProgressReportThrottle {
    pub fn new(step: u8) -> Self {
        Self {
            step: step.clamp(1, 100),
            last_reported: None,
        }
    }

    /// Returns the percent to report for this event, if any
    pub fn observe(&mut self, bytes_loaded: u64, bytes_total: u64) -> Option<u8> {
        let percent = loaded_percent(bytes_loaded, bytes_total);
        if percent % self.step != 0 || self.last_reported == Some(percent) {
            return None;
        }
        self.last_reported = Some(percent);
        Some(percent)
    }
}
