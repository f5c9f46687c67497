//! Rep-boundary detection over a stream of per-frame outcomes: a rep opens
//! on the standing-to-descending transition and closes either when the
//! analyzer itself signals completion or when the body returns to standing
//! having passed through the bottom phase. Reps that run longer than
//! `max_duration_ms` are dropped rather than scored.

use analyzers::GenericPhase;

use crate::rep_result::TimedOutcome;

#[derive(Debug, Clone, Default)]
pub struct SegmentationReport {
    pub reps: Vec<Vec<TimedOutcome>>,
    pub dropped_rep_count: usize,
}

/// Segments a full session's frame outcomes into reps. `frames` must be in
/// non-decreasing timestamp order.
#[must_use]
pub fn segment_reps(frames: &[TimedOutcome], min_duration_ms: f64, max_duration_ms: f64) -> SegmentationReport {
    let mut report = SegmentationReport::default();
    let mut current: Vec<TimedOutcome> = Vec::new();
    let mut in_rep = false;
    let mut reached_bottom = false;
    let mut prev_phase: Option<GenericPhase> = None;

    for frame in frames {
        let phase = frame.outcome.phase;

        if !in_rep {
            if prev_phase == Some(GenericPhase::Standing) && phase == GenericPhase::Descending {
                in_rep = true;
                reached_bottom = false;
                current.push(frame.clone());
            }
            prev_phase = Some(phase);
            continue;
        }

        current.push(frame.clone());
        if phase == GenericPhase::Bottom {
            reached_bottom = true;
        }

        let duration_so_far = current.last().map(|f| f.timestamp_ms).unwrap_or_default()
            - current.first().map(|f| f.timestamp_ms).unwrap_or_default();

        let completed_by_signal = frame.outcome.rep_completed;
        let completed_by_return = reached_bottom && phase == GenericPhase::Standing;

        if completed_by_signal || completed_by_return {
            close_rep(&mut current, &mut report, min_duration_ms, max_duration_ms);
            in_rep = false;
        } else if duration_so_far > max_duration_ms {
            report.dropped_rep_count += 1;
            current.clear();
            in_rep = false;
        }

        prev_phase = Some(phase);
    }

    report
}

fn close_rep(current: &mut Vec<TimedOutcome>, report: &mut SegmentationReport, min_duration_ms: f64, max_duration_ms: f64) {
    if current.is_empty() {
        return;
    }
    let duration = current.last().unwrap().timestamp_ms - current.first().unwrap().timestamp_ms;
    if duration >= min_duration_ms && duration <= max_duration_ms {
        report.reps.push(std::mem::take(current));
    } else {
        report.dropped_rep_count += 1;
        current.clear();
    }
}
