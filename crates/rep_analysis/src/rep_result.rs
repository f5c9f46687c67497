//! Per-rep aggregation: rolling a rep's frame-by-frame outcomes into one
//! composite score, a worst-moment callout, and the most frequent issues
//! per rep.

use std::collections::HashMap;

use analyzers::GenericPhase;

use crate::frame_analysis::FrameOutcome;
use crate::phase_weights::PhaseWeights;

/// A single analyzed frame tagged with its wall-clock timestamp, as
/// accumulated by the segmentation stage while a rep is open.
#[derive(Debug, Clone)]
pub struct TimedOutcome {
    pub timestamp_ms: f64,
    pub outcome: FrameOutcome,
}

/// The single lowest-scoring frame within a rep. Ties are broken by
/// whichever occurred first.
#[derive(Debug, Clone)]
pub struct WorstMoment {
    pub timestamp_ms: f64,
    pub score: u8,
    pub issues: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct RepAnalysisResult {
    pub rep_number: u32,
    pub start_timestamp_ms: f64,
    pub end_timestamp_ms: f64,
    pub duration_ms: f64,
    pub composite_score: u8,
    pub standing_avg_score: Option<f32>,
    pub descending_avg_score: Option<f32>,
    pub bottom_avg_score: Option<f32>,
    pub ascending_avg_score: Option<f32>,
    pub frame_count: usize,
    pub min_score: u8,
    pub max_score: u8,
    pub avg_score: f32,
    pub worst_moment: WorstMoment,
    pub primary_issues: Vec<(&'static str, u32)>,
    pub feedback_counts: HashMap<&'static str, u32>,
}

fn phase_average(frames: &[TimedOutcome], phase: GenericPhase) -> Option<f32> {
    let scores: Vec<f32> = frames
        .iter()
        .filter(|f| f.outcome.phase == phase)
        .map(|f| f32::from(f.outcome.score))
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    }
}

fn find_worst_moment(frames: &[TimedOutcome]) -> WorstMoment {
    let worst = frames
        .iter()
        .min_by(|a, b| {
            a.outcome
                .score
                .cmp(&b.outcome.score)
                .then(a.timestamp_ms.partial_cmp(&b.timestamp_ms).unwrap_or(std::cmp::Ordering::Equal))
        })
        .expect("a rep always has at least one frame");
    WorstMoment {
        timestamp_ms: worst.timestamp_ms,
        score: worst.outcome.score,
        issues: worst.outcome.issues.clone(),
    }
}

fn top_primary_issues(counts: &HashMap<&'static str, u32>) -> Vec<(&'static str, u32)> {
    let mut entries: Vec<(&'static str, u32)> = counts.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    entries.truncate(5);
    entries
}

/// Aggregates one rep's frames into a [`RepAnalysisResult`]. `rep_number` is
/// 1-indexed, matching how reps are surfaced to callers.
#[must_use]
pub fn aggregate_rep(rep_number: u32, frames: &[TimedOutcome], weights: PhaseWeights) -> RepAnalysisResult {
    assert!(!frames.is_empty(), "aggregate_rep requires at least one frame");

    let start_timestamp_ms = frames.first().map(|f| f.timestamp_ms).unwrap_or_default();
    let end_timestamp_ms = frames.last().map(|f| f.timestamp_ms).unwrap_or_default();

    let standing_avg_score = phase_average(frames, GenericPhase::Standing);
    let descending_avg_score = phase_average(frames, GenericPhase::Descending);
    let bottom_avg_score = phase_average(frames, GenericPhase::Bottom);
    let ascending_avg_score = phase_average(frames, GenericPhase::Ascending);

    let weighted_sum = [
        (standing_avg_score, weights.standing),
        (descending_avg_score, weights.descending),
        (bottom_avg_score, weights.bottom),
        (ascending_avg_score, weights.ascending),
    ]
    .into_iter()
    .filter_map(|(avg, w)| avg.map(|a| a * w))
    .sum::<f32>();

    // Re-normalize over only the phases this rep actually visited, so a rep
    // that never reaches `Bottom` isn't penalized for a phase it couldn't
    // have produced frames in.
    let weight_total = [
        (standing_avg_score, weights.standing),
        (descending_avg_score, weights.descending),
        (bottom_avg_score, weights.bottom),
        (ascending_avg_score, weights.ascending),
    ]
    .into_iter()
    .filter_map(|(avg, w)| avg.map(|_| w))
    .sum::<f32>();

    let composite_score = if weight_total > 0.0 {
        (weighted_sum / weight_total).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    let scores: Vec<u8> = frames.iter().map(|f| f.outcome.score).collect();
    let min_score = scores.iter().copied().min().unwrap_or(0);
    let max_score = scores.iter().copied().max().unwrap_or(0);
    let avg_score = scores.iter().map(|&s| f32::from(s)).sum::<f32>() / scores.len() as f32;

    let mut feedback_counts: HashMap<&'static str, u32> = HashMap::new();
    for frame in frames {
        for &issue in &frame.outcome.issues {
            *feedback_counts.entry(issue).or_insert(0) += 1;
        }
    }
    let primary_issues = top_primary_issues(&feedback_counts);
    let worst_moment = find_worst_moment(frames);

    RepAnalysisResult {
        rep_number,
        start_timestamp_ms,
        end_timestamp_ms,
        duration_ms: end_timestamp_ms - start_timestamp_ms,
        composite_score,
        standing_avg_score,
        descending_avg_score,
        bottom_avg_score,
        ascending_avg_score,
        frame_count: frames.len(),
        min_score,
        max_score,
        avg_score,
        worst_moment,
        primary_issues,
        feedback_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(score: u8, phase: GenericPhase, issues: &[&'static str]) -> FrameOutcome {
        FrameOutcome {
            score,
            phase,
            rep_completed: false,
            issues: issues.to_vec(),
            coordination_score: None,
        }
    }

    #[test]
    fn worst_moment_picks_earliest_on_tie() {
        let frames = vec![
            TimedOutcome { timestamp_ms: 0.0, outcome: outcome(80, GenericPhase::Standing, &[]) },
            TimedOutcome { timestamp_ms: 100.0, outcome: outcome(40, GenericPhase::Bottom, &["knee_valgus"]) },
            TimedOutcome { timestamp_ms: 200.0, outcome: outcome(40, GenericPhase::Ascending, &["torso_lean"]) },
        ];
        let weights = PhaseWeights { standing: 0.1, descending: 0.2, bottom: 0.5, ascending: 0.2 };
        let result = aggregate_rep(1, &frames, weights);
        assert_eq!(result.worst_moment.timestamp_ms, 100.0);
        assert_eq!(result.min_score, 40);
    }

    #[test]
    fn primary_issues_are_ranked_by_frequency() {
        let frames = vec![
            TimedOutcome { timestamp_ms: 0.0, outcome: outcome(90, GenericPhase::Bottom, &["a", "b"]) },
            TimedOutcome { timestamp_ms: 10.0, outcome: outcome(85, GenericPhase::Bottom, &["a"]) },
            TimedOutcome { timestamp_ms: 20.0, outcome: outcome(80, GenericPhase::Bottom, &["a", "c"]) },
        ];
        let weights = PhaseWeights { standing: 0.0, descending: 0.0, bottom: 1.0, ascending: 0.0 };
        let result = aggregate_rep(1, &frames, weights);
        assert_eq!(result.primary_issues[0], ("a", 3));
    }

    #[test]
    fn missing_phase_does_not_drag_down_composite() {
        // Only `bottom` frames present; weighting re-normalizes to just that phase.
        let frames = vec![
            TimedOutcome { timestamp_ms: 0.0, outcome: outcome(100, GenericPhase::Bottom, &[]) },
            TimedOutcome { timestamp_ms: 10.0, outcome: outcome(100, GenericPhase::Bottom, &[]) },
        ];
        let weights = PhaseWeights { standing: 0.1, descending: 0.2, bottom: 0.5, ascending: 0.2 };
        let result = aggregate_rep(1, &frames, weights);
        assert_eq!(result.composite_score, 100);
    }
}
