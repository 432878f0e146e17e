use crate::config::same_category;

/// Agreement between context-only predictions and final categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccuracyTracker {
    pub correct: u32,
    pub total: u32,
}

impl AccuracyTracker {
    /// Diagrams without a prediction are not counted.
    pub fn record(&mut self, predicted: Option<&str>, final_category: &str) {
        let Some(predicted) = predicted else {
            return;
        };
        self.total += 1;
        if same_category(predicted, final_category) {
            self.correct += 1;
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_is_zero() {
        assert_eq!(AccuracyTracker::default().percentage(), 0.0);
    }

    #[test]
    fn test_missing_prediction_not_counted() {
        let mut tracker = AccuracyTracker::default();
        tracker.record(None, "flowchart");
        assert_eq!(tracker.total, 0);
        assert_eq!(tracker.percentage(), 0.0);
    }

    #[test]
    fn test_three_of_four() {
        let mut tracker = AccuracyTracker::default();
        tracker.record(Some("flowchart"), "Flowchart");
        tracker.record(Some("class_diagram"), "class_diagram");
        tracker.record(Some("network"), "other");
        tracker.record(Some("git workflow"), "GIT WORKFLOW");
        tracker.record(None, "unknown");
        assert_eq!(tracker, AccuracyTracker { correct: 3, total: 4 });
        assert_eq!(tracker.percentage(), 75.0);
    }
}
