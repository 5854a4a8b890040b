use super::window::RollingWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Default number of quality scores kept in the history.
pub const DEFAULT_QUALITY_WINDOW: usize = 50;

pub const MIN_QUALITY_SCORE: f64 = 0.0;
pub const MAX_QUALITY_SCORE: f64 = 10.0;

/// Band boundaries on the 0-10 quality scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            excellent: 8.0,
            good: 6.0,
            acceptable: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Acceptable => "acceptable",
            QualityLevel::Poor => "poor",
        };
        f.write_str(name)
    }
}

impl QualityThresholds {
    pub fn classify(&self, score: f64) -> QualityLevel {
        if score >= self.excellent {
            QualityLevel::Excellent
        } else if score >= self.good {
            QualityLevel::Good
        } else if score >= self.acceptable {
            QualityLevel::Acceptable
        } else {
            QualityLevel::Poor
        }
    }
}

/// Summary of the scores in the window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QualityStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; 0.0 with fewer than two samples.
    pub std_dev: f64,
    pub sample_count: usize,
    /// Fraction of samples at or above the acceptable threshold.
    pub acceptable_rate: f64,
}

/// Rolling record of per-utterance quality scores.
#[derive(Debug, Clone)]
pub struct QualityTracker {
    thresholds: QualityThresholds,
    scores: RollingWindow<f64>,
}

impl Default for QualityTracker {
    fn default() -> Self {
        Self::new(QualityThresholds::default(), DEFAULT_QUALITY_WINDOW)
    }
}

impl QualityTracker {
    pub fn new(thresholds: QualityThresholds, window_size: usize) -> Self {
        Self {
            thresholds,
            scores: RollingWindow::new(window_size),
        }
    }

    pub fn with_window(window_size: usize) -> Self {
        Self::new(QualityThresholds::default(), window_size)
    }

    pub fn thresholds(&self) -> QualityThresholds {
        self.thresholds
    }

    /// Stores `score` clamped to [0, 10] and returns its band. NaN is stored as 0.
    pub fn record_score(
        &mut self,
        score: f64,
        metadata: Option<HashMap<String, String>>,
    ) -> QualityLevel {
        let clamped = if score.is_nan() {
            MIN_QUALITY_SCORE
        } else {
            score.clamp(MIN_QUALITY_SCORE, MAX_QUALITY_SCORE)
        };
        self.scores.push(clamped);

        let level = self.thresholds.classify(clamped);
        debug!(
            score = (clamped * 100.0).round() / 100.0,
            level = %level,
            metadata = ?metadata.unwrap_or_default(),
            "Audio quality recorded"
        );
        level
    }

    /// Stored scores, oldest first.
    pub fn scores(&self) -> Vec<f64> {
        self.scores.to_vec()
    }

    pub fn get_average_quality(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    pub fn get_quality_stats(&self) -> QualityStats {
        let count = self.scores.len();
        if count == 0 {
            return QualityStats::default();
        }

        let average = self.get_average_quality();
        let min = self.scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = if count > 1 {
            let variance = self
                .scores
                .iter()
                .map(|s| (s - average).powi(2))
                .sum::<f64>()
                / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };
        let acceptable = self
            .scores
            .iter()
            .filter(|s| **s >= self.thresholds.acceptable)
            .count();

        QualityStats {
            average,
            min,
            max,
            std_dev,
            sample_count: count,
            acceptable_rate: acceptable as f64 / count as f64,
        }
    }

    pub fn meets_minimum_standard(&self, min_score: f64) -> bool {
        self.get_average_quality() >= min_score
    }

    pub fn reset(&mut self) {
        self.scores.clear();
    }
}
