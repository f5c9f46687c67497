//! End-to-end scenarios exercising the composed surface rather than any
//! one crate in isolation: a single frame through each exercise analyzer,
//! the prediction engine across a short stationary run, a plank hold, and
//! a full video segmented into reps.

use fitform::exercises::{deadlift, plank, pushup, squat};
use fitform::{
    segment_reps, AnglePredictionEngine, CriticalBand, DepthConfig, FrameOutcome, GenericPhase,
    Landmark, LandmarkFrame, LandmarkIndex, PredictionConfig, SmoothingConfig, TimedOutcome,
    NUM_LANDMARKS,
};

fn squat_bottom_frame() -> LandmarkFrame {
    let mut points = [Landmark::invalid(); NUM_LANDMARKS];
    points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.4, 0.35, 0.0, 0.9);
    points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.6, 0.35, 0.0, 0.9);
    points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.42, 0.60, 0.0, 0.9);
    points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.58, 0.60, 0.0, 0.9);
    points[LandmarkIndex::LeftKnee.idx()] = Landmark::new(0.38, 0.65, 0.1, 0.9);
    points[LandmarkIndex::RightKnee.idx()] = Landmark::new(0.62, 0.65, 0.1, 0.9);
    points[LandmarkIndex::LeftAnkle.idx()] = Landmark::new(0.42, 0.9, 0.0, 0.9);
    points[LandmarkIndex::RightAnkle.idx()] = Landmark::new(0.58, 0.9, 0.0, 0.9);
    points[LandmarkIndex::LeftHeel.idx()] = Landmark::new(0.42, 0.92, -0.02, 0.9);
    points[LandmarkIndex::RightHeel.idx()] = Landmark::new(0.58, 0.92, -0.02, 0.9);
    points[LandmarkIndex::LeftFootIndex.idx()] = Landmark::new(0.42, 0.92, 0.08, 0.9);
    points[LandmarkIndex::RightFootIndex.idx()] = Landmark::new(0.58, 0.92, 0.08, 0.9);
    LandmarkFrame::new(points)
}

#[test]
fn squat_bottom_frame_scores_a_deep_bend_with_good_symmetry() {
    let state = squat::create_initial_state(SmoothingConfig::default(), DepthConfig::default());
    let (result, _state) = squat::analyze(&squat_bottom_frame(), state);

    let avg_knee = (result.raw_angles.get(&squat::SquatChannel::LeftKnee).unwrap().smoothed
        + result.raw_angles.get(&squat::SquatChannel::RightKnee).unwrap().smoothed)
        / 2.0;
    assert!((60.0..130.0).contains(&avg_knee), "avg knee angle {avg_knee} out of range");
    assert!(result.score > 0);
    assert!(result.feedback.left_knee.item_score() > 0.0);
    assert!(result.feedback.right_knee.item_score() > 0.0);
}

fn deadlift_lockout_frame() -> LandmarkFrame {
    let mut points = [Landmark::invalid(); NUM_LANDMARKS];
    points[LandmarkIndex::Nose.idx()] = Landmark::new(0.5, 0.15, 0.0, 0.9);
    points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.45, 0.25, 0.0, 0.9);
    points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.55, 0.25, 0.0, 0.9);
    points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.45, 0.55, 0.0, 0.9);
    points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.55, 0.55, 0.0, 0.9);
    points[LandmarkIndex::LeftKnee.idx()] = Landmark::new(0.45, 0.78, 0.0, 0.9);
    points[LandmarkIndex::RightKnee.idx()] = Landmark::new(0.55, 0.78, 0.0, 0.9);
    points[LandmarkIndex::LeftAnkle.idx()] = Landmark::new(0.45, 0.97, 0.0, 0.9);
    points[LandmarkIndex::RightAnkle.idx()] = Landmark::new(0.55, 0.97, 0.0, 0.9);
    points[LandmarkIndex::LeftWrist.idx()] = Landmark::new(0.46, 0.5, 0.0, 0.9);
    points[LandmarkIndex::RightWrist.idx()] = Landmark::new(0.54, 0.5, 0.0, 0.9);
    LandmarkFrame::new(points)
}

#[test]
fn lockout_after_lift_without_prior_lockout_completes_a_rep() {
    let mut state = deadlift::create_initial_state(SmoothingConfig::default(), DepthConfig::default());
    state.phase = deadlift::DeadliftPhase::Lift;
    state.lockout_reached = false;
    state.last_hip_hinge_angle = 130.0;

    let (result, new_state) = deadlift::analyze(&deadlift_lockout_frame(), state);

    assert_eq!(result.phase, deadlift::DeadliftPhase::Lockout);
    assert_eq!(result.phase.to_generic(), GenericPhase::Standing);
    assert!(result.rep_completed);
    assert!(new_state.lockout_reached);
    assert_eq!(new_state.rep_count, 1);
}

fn pushup_bottom_frame() -> LandmarkFrame {
    // Shoulder directly above elbow, wrist directly beside elbow, mirrored
    // left/right: the angle at the elbow between those two vectors is an
    // exact 90 degrees by construction.
    let mut points = [Landmark::invalid(); NUM_LANDMARKS];
    points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.4, 0.3, 0.0, 0.9);
    points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.6, 0.3, 0.0, 0.9);
    points[LandmarkIndex::LeftElbow.idx()] = Landmark::new(0.4, 0.4, 0.0, 0.9);
    points[LandmarkIndex::RightElbow.idx()] = Landmark::new(0.6, 0.4, 0.0, 0.9);
    points[LandmarkIndex::LeftWrist.idx()] = Landmark::new(0.5, 0.4, 0.0, 0.9);
    points[LandmarkIndex::RightWrist.idx()] = Landmark::new(0.5, 0.4, 0.0, 0.9);
    points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.4, 0.6, 0.0, 0.9);
    points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.6, 0.6, 0.0, 0.9);
    LandmarkFrame::new(points)
}

#[test]
fn ninety_degree_elbow_bend_while_descending_reads_as_bottom() {
    let mut state = pushup::create_initial_state(SmoothingConfig::default(), DepthConfig::default());
    state.phase = GenericPhase::Descending;
    state.last_avg_elbow_angle = 105.0;

    let (result, _state) = pushup::analyze(&pushup_bottom_frame(), state);

    assert_eq!(result.phase, GenericPhase::Bottom);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Channel {
    LeftKnee,
}

#[test]
fn stationary_angle_predicts_itself_with_high_confidence_and_no_crossing() {
    let mut engine = AnglePredictionEngine::new(
        PredictionConfig::default(),
        vec![(Channel::LeftKnee, CriticalBand { min: 0.0, max: 200.0 })],
    );

    let mut t = 1000u64;
    for _ in 0..10 {
        engine.predict(&[(Channel::LeftKnee, 90.0)], t);
        t += 33;
    }
    let result = engine.predict(&[(Channel::LeftKnee, 90.0)], t);
    let prediction = result.predictions[&Channel::LeftKnee];

    assert!((prediction.predicted_value - 90.0).abs() < 1e-3);
    assert!(result.threshold_crossings.is_empty());
    assert!(prediction.is_reliable);
    assert!(prediction.confidence > 0.5);
}

fn good_plank_frame() -> LandmarkFrame {
    let mut points = [Landmark::invalid(); NUM_LANDMARKS];
    points[LandmarkIndex::Nose.idx()] = Landmark::new(0.5, 0.48, 0.0, 0.9);
    points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.45, 0.5, 0.0, 0.9);
    points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.55, 0.5, 0.0, 0.9);
    points[LandmarkIndex::LeftWrist.idx()] = Landmark::new(0.45, 0.5, -0.3, 0.9);
    points[LandmarkIndex::RightWrist.idx()] = Landmark::new(0.55, 0.5, -0.3, 0.9);
    points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.45, 0.5, 0.3, 0.9);
    points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.55, 0.5, 0.3, 0.9);
    points[LandmarkIndex::LeftAnkle.idx()] = Landmark::new(0.45, 0.5, 0.7, 0.9);
    points[LandmarkIndex::RightAnkle.idx()] = Landmark::new(0.55, 0.5, 0.7, 0.9);
    LandmarkFrame::new(points)
}

#[test]
fn plank_hold_accumulates_then_resets_on_a_dropped_pose() {
    let state = plank::create_initial_state(SmoothingConfig::default(), DepthConfig::default());
    let (result0, state) = plank::analyze(&good_plank_frame(), 0.0, state);
    assert!(result0.is_valid_plank);
    assert_eq!(result0.current_hold_time_ms, 0.0);

    let (result1, state) = plank::analyze(&good_plank_frame(), 1000.0, state);
    assert!(result1.is_valid_plank);
    assert!((result1.current_hold_time_ms - 1000.0).abs() < 1.0);

    let (result2, _state) = plank::analyze(&LandmarkFrame::default(), 1500.0, state);
    assert_eq!(result2.current_hold_time_ms, 0.0);
    assert!((result2.total_hold_time_ms - 1000.0).abs() < 1.0);
}

fn phase_outcome(timestamp_ms: f64, phase: GenericPhase, rep_completed: bool) -> TimedOutcome {
    TimedOutcome {
        timestamp_ms,
        outcome: FrameOutcome { score: 85, phase, rep_completed, issues: Vec::new(), coordination_score: None },
    }
}

#[test]
fn a_two_rep_session_segments_into_exactly_two_reps() {
    use GenericPhase::{Ascending, Bottom, Descending, Standing};

    let mut frames = Vec::new();
    let mut t = 0.0;
    let mut push_block = |phase: GenericPhase, count: usize, t: &mut f64, completed_last: bool| {
        for i in 0..count {
            let rep_completed = completed_last && i == count - 1;
            frames.push(phase_outcome(*t, phase, rep_completed));
            *t += 33.0;
        }
    };

    // standing x5, descending x10, bottom x5, ascending x10 (completes), twice.
    for _ in 0..2 {
        push_block(Standing, 5, &mut t, false);
        push_block(Descending, 10, &mut t, false);
        push_block(Bottom, 5, &mut t, false);
        push_block(Ascending, 10, &mut t, true);
    }
    push_block(Standing, 5, &mut t, false);

    let report = segment_reps(&frames, 100.0, 10_000.0);
    assert_eq!(report.reps.len(), 2);

    let weights = fitform::default_phase_weights(fitform::ExerciseType::Squat);
    let reps: Vec<_> = report
        .reps
        .iter()
        .enumerate()
        .map(|(i, group)| fitform::aggregate_rep(i as u32 + 1, group, weights))
        .collect();
    assert!(reps.iter().any(|r| r.bottom_avg_score.is_some()));

    let consistency = fitform::compute_consistency(&reps);
    assert!(consistency.best_rep_index < reps.len());
    assert!(consistency.worst_rep_index < reps.len());
}
