//! Cross-rep consistency metrics: score/duration spread, a linear trend
//! over rep index, and a per-rep comparison against the session mean and
//! the previous rep.

use crate::rep_result::RepAnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    Fluctuating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Improved,
    Worsened,
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
pub struct RepDeviation {
    pub rep_number: u32,
    pub score_deviation_stddevs: f32,
    pub direction_vs_previous: Direction,
}

#[derive(Debug, Clone)]
pub struct ConsistencyMetrics {
    /// `max(0, round(100 - 2*scoreStdDev))`, clamped to `[0, 100]`.
    pub overall_consistency: u8,
    pub score_std_dev: f32,
    pub duration_std_dev: f32,
    pub trend: Trend,
    pub slope: f32,
    pub best_rep_index: usize,
    pub worst_rep_index: usize,
    pub rep_deviations: Vec<RepDeviation>,
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}

/// Ordinary least-squares slope of `scores` against their rep index
/// `0, 1, 2, ...`.
fn regression_slope(scores: &[f32]) -> f32 {
    if scores.len() < 2 {
        return 0.0;
    }
    let xs: Vec<f32> = (0..scores.len()).map(|i| i as f32).collect();
    let x_mean = mean(&xs);
    let y_mean = mean(scores);
    let numerator: f32 = xs.iter().zip(scores).map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
    let denominator: f32 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    if denominator.abs() < 1e-6 {
        0.0
    } else {
        numerator / denominator
    }
}

fn classify_trend(slope: f32, score_std_dev: f32) -> Trend {
    if slope > 2.0 {
        Trend::Improving
    } else if slope < -2.0 {
        Trend::Declining
    } else if slope.abs() < 1.0 {
        Trend::Stable
    } else if score_std_dev > 15.0 {
        Trend::Fluctuating
    } else {
        Trend::Stable
    }
}

fn direction_vs_previous(current: f32, previous: f32) -> Direction {
    if current > previous {
        Direction::Improved
    } else if current < previous {
        Direction::Worsened
    } else {
        Direction::Unchanged
    }
}

/// Computes consistency metrics across a completed session's reps. Panics
/// only if called with an empty slice; callers should skip this stage
/// entirely when no reps were segmented.
#[must_use]
pub fn compute_consistency(reps: &[RepAnalysisResult]) -> ConsistencyMetrics {
    assert!(!reps.is_empty(), "compute_consistency requires at least one rep");

    let scores: Vec<f32> = reps.iter().map(|r| f32::from(r.composite_score)).collect();
    let durations: Vec<f32> = reps.iter().map(|r| r.duration_ms as f32).collect();

    let score_std_dev = std_dev(&scores);
    let duration_std_dev = std_dev(&durations);
    let slope = regression_slope(&scores);
    let trend = classify_trend(slope, score_std_dev);

    let best_rep_index = scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let worst_rep_index = scores
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let score_mean = mean(&scores);
    let rep_deviations = reps
        .iter()
        .enumerate()
        .map(|(i, rep)| {
            let score = f32::from(rep.composite_score);
            let score_deviation_stddevs = if score_std_dev > 1e-6 { (score - score_mean) / score_std_dev } else { 0.0 };
            let direction_vs_previous = if i == 0 {
                Direction::Unchanged
            } else {
                direction_vs_previous(score, scores[i - 1])
            };
            RepDeviation {
                rep_number: rep.rep_number,
                score_deviation_stddevs,
                direction_vs_previous,
            }
        })
        .collect();

    let overall_consistency = (100.0 - 2.0 * score_std_dev).round().clamp(0.0, 100.0) as u8;

    ConsistencyMetrics {
        overall_consistency,
        score_std_dev,
        duration_std_dev,
        trend,
        slope,
        best_rep_index,
        worst_rep_index,
        rep_deviations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rep_result::WorstMoment;
    use std::collections::HashMap;

    fn rep(rep_number: u32, composite_score: u8) -> RepAnalysisResult {
        RepAnalysisResult {
            rep_number,
            start_timestamp_ms: 0.0,
            end_timestamp_ms: 1000.0,
            duration_ms: 1000.0,
            composite_score,
            standing_avg_score: None,
            descending_avg_score: None,
            bottom_avg_score: None,
            ascending_avg_score: None,
            frame_count: 10,
            min_score: composite_score,
            max_score: composite_score,
            avg_score: f32::from(composite_score),
            worst_moment: WorstMoment { timestamp_ms: 0.0, score: composite_score, issues: Vec::new() },
            primary_issues: Vec::new(),
            feedback_counts: HashMap::new(),
        }
    }

    #[test]
    fn rising_scores_trend_improving() {
        let reps = vec![rep(1, 60), rep(2, 75), rep(3, 90)];
        let metrics = compute_consistency(&reps);
        assert_eq!(metrics.trend, Trend::Improving);
        assert!(metrics.slope > 0.0);
        assert_eq!(metrics.best_rep_index, 2);
        assert_eq!(metrics.worst_rep_index, 0);
    }

    #[test]
    fn flat_scores_trend_stable() {
        let reps = vec![rep(1, 85), rep(2, 85), rep(3, 85)];
        let metrics = compute_consistency(&reps);
        assert_eq!(metrics.trend, Trend::Stable);
        assert_eq!(metrics.score_std_dev, 0.0);
    }

    #[test]
    fn erratic_scores_trend_fluctuating() {
        let reps = vec![rep(1, 90), rep(2, 30), rep(3, 85), rep(4, 35), rep(5, 80)];
        let metrics = compute_consistency(&reps);
        assert_eq!(metrics.trend, Trend::Fluctuating);
    }

    #[test]
    fn rep_deviations_track_direction_vs_previous() {
        let reps = vec![rep(1, 60), rep(2, 90), rep(3, 70)];
        let metrics = compute_consistency(&reps);
        assert_eq!(metrics.rep_deviations[0].direction_vs_previous, Direction::Unchanged);
        assert_eq!(metrics.rep_deviations[1].direction_vs_previous, Direction::Improved);
        assert_eq!(metrics.rep_deviations[2].direction_vs_previous, Direction::Worsened);
    }
}
