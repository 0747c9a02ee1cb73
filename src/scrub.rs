//! Classifies image selections as deliberate or rapid "scrubbing" navigation.
//!
//! A selection landing within `SCRUB_THRESHOLD_MS` of the previous one marks
//! the user as scrubbing, which tells the load coordinator to defer the
//! expensive full-resolution decode until navigation settles.

pub const SCRUB_THRESHOLD_MS: f64 = 120.0;

#[derive(Debug, Default)]
pub struct ScrubDetector {
    last_selection_ms: Option<f64>,
}

impl ScrubDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a selection at `now_ms` and report whether it counts as
    /// scrubbing, i.e. it followed the previous selection too quickly.
    pub fn mark_selection(&mut self, now_ms: f64) -> bool {
        let scrubbing = self
            .last_selection_ms
            .is_some_and(|prev| now_ms - prev < SCRUB_THRESHOLD_MS);
        self.last_selection_ms = Some(now_ms);
        scrubbing
    }

    pub fn reset(&mut self) {
        self.last_selection_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_selection_is_never_scrubbing() {
        let mut detector = ScrubDetector::new();
        assert!(!detector.mark_selection(1_000.0));
    }

    #[test]
    fn rapid_selections_are_scrubbing() {
        let mut detector = ScrubDetector::new();
        detector.mark_selection(1_000.0);
        assert!(detector.mark_selection(1_050.0));
        assert!(detector.mark_selection(1_169.0));
    }

    #[test]
    fn selection_on_the_threshold_is_deliberate() {
        let mut detector = ScrubDetector::new();
        detector.mark_selection(1_000.0);
        assert!(!detector.mark_selection(1_000.0 + SCRUB_THRESHOLD_MS));
        assert!(!detector.mark_selection(2_000.0));
    }

    #[test]
    fn reset_forgets_history() {
        let mut detector = ScrubDetector::new();
        detector.mark_selection(1_000.0);
        detector.reset();
        assert!(!detector.mark_selection(1_010.0));
    }
}
