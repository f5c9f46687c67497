//! Per-phase weighting used to roll a rep's frame scores into one
//! composite per-rep score.

use analyzers::GenericPhase;

use crate::exercise_type::ExerciseType;

/// Weight given to each generic phase's average score within a rep. Expected
/// to sum to `1.0`; each `default_phase_weights` entry is tested for that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWeights {
    pub standing: f32,
    pub descending: f32,
    pub bottom: f32,
    pub ascending: f32,
}

impl PhaseWeights {
    #[must_use]
    pub fn weight_for(&self, phase: GenericPhase) -> f32 {
        match phase {
            GenericPhase::Standing => self.standing,
            GenericPhase::Descending => self.descending,
            GenericPhase::Bottom => self.bottom,
            GenericPhase::Ascending => self.ascending,
        }
    }
}

/// Default weighting for the named exercise.
#[must_use]
pub fn default_phase_weights(exercise_type: ExerciseType) -> PhaseWeights {
    match exercise_type {
        ExerciseType::Squat | ExerciseType::Lunge => PhaseWeights {
            standing: 0.1,
            descending: 0.2,
            bottom: 0.5,
            ascending: 0.2,
        },
        ExerciseType::Deadlift => PhaseWeights {
            standing: 0.15,
            descending: 0.2,
            bottom: 0.45,
            ascending: 0.2,
        },
        ExerciseType::Pushup => PhaseWeights {
            standing: 0.1,
            descending: 0.25,
            bottom: 0.4,
            ascending: 0.25,
        },
        ExerciseType::Plank => PhaseWeights {
            standing: 1.0,
            descending: 0.0,
            bottom: 0.0,
            ascending: 0.0,
        },
    }
}
