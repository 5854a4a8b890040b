// Integration tests for quality score tracking

use launchpad_voice::metrics::{QualityLevel, QualityThresholds, QualityTracker};
use std::collections::HashMap;

#[test]
fn test_scores_are_clamped_to_scale() {
    let mut tracker = QualityTracker::default();

    tracker.record_score(15.0, None);
    tracker.record_score(-3.0, None);
    tracker.record_score(7.5, None);

    assert_eq!(tracker.scores(), vec![10.0, 0.0, 7.5]);
}

#[test]
fn test_record_returns_band_of_clamped_score() {
    let mut tracker = QualityTracker::default();

    assert_eq!(tracker.record_score(42.0, None), QualityLevel::Excellent);
    assert_eq!(tracker.record_score(6.5, None), QualityLevel::Good);
    assert_eq!(tracker.record_score(4.0, None), QualityLevel::Acceptable);
    assert_eq!(tracker.record_score(f64::NAN, None), QualityLevel::Poor);
}

#[test]
fn test_metadata_is_accepted() {
    let mut tracker = QualityTracker::default();
    let mut metadata = HashMap::new();
    metadata.insert("utterance".to_string(), "greeting".to_string());

    tracker.record_score(8.5, Some(metadata));

    assert_eq!(tracker.scores(), vec![8.5]);
}

#[test]
fn test_window_keeps_most_recent_scores() {
    let mut tracker = QualityTracker::with_window(3);
    for score in [1.0, 2.0, 3.0, 4.0, 5.0] {
        tracker.record_score(score, None);
    }

    assert_eq!(tracker.scores(), vec![3.0, 4.0, 5.0]);
    assert_eq!(tracker.get_average_quality(), 4.0);
}

#[test]
fn test_empty_tracker() {
    let tracker = QualityTracker::default();

    assert_eq!(tracker.get_average_quality(), 0.0);
    let stats = tracker.get_quality_stats();
    assert_eq!(stats.sample_count, 0);
    assert_eq!(stats.std_dev, 0.0);
    assert!(!tracker.meets_minimum_standard(6.0));
}

#[test]
fn test_stats_summary() {
    let mut tracker = QualityTracker::default();
    for score in [9.0, 7.0, 5.0, 3.0] {
        tracker.record_score(score, None);
    }

    let stats = tracker.get_quality_stats();
    assert_eq!(stats.sample_count, 4);
    assert_eq!(stats.average, 6.0);
    assert_eq!(stats.min, 3.0);
    assert_eq!(stats.max, 9.0);
    // 3 of 4 at or above the acceptable threshold of 4.0
    assert_eq!(stats.acceptable_rate, 0.75);
}

#[test]
fn test_single_score_has_zero_deviation() {
    let mut tracker = QualityTracker::default();
    tracker.record_score(6.0, None);

    assert_eq!(tracker.get_quality_stats().std_dev, 0.0);
}

#[test]
fn test_minimum_standard() {
    let mut tracker = QualityTracker::default();
    tracker.record_score(6.0, None);
    tracker.record_score(6.0, None);
    assert!(tracker.meets_minimum_standard(6.0));

    tracker.record_score(5.0, None);
    assert!(!tracker.meets_minimum_standard(6.0));
}

#[test]
fn test_custom_thresholds() {
    let thresholds = QualityThresholds {
        excellent: 9.0,
        good: 7.0,
        acceptable: 5.0,
    };
    let mut tracker = QualityTracker::new(thresholds, 10);

    assert_eq!(tracker.record_score(8.5, None), QualityLevel::Good);
    assert_eq!(tracker.record_score(4.5, None), QualityLevel::Poor);
    assert_eq!(tracker.get_quality_stats().acceptable_rate, 0.5);
}

#[test]
fn test_reset_clears_history() {
    let mut tracker = QualityTracker::default();
    tracker.record_score(9.0, None);

    tracker.reset();

    assert!(tracker.scores().is_empty());
    assert_eq!(tracker.get_average_quality(), 0.0);
}
