//! # analyzers
//!
//! The five exercise analyzers (L3), their shared sub-analyzers (L2), the
//! integrated velocity-angle layer (L4), and the ideal/acceptable scoring
//! primitive every analyzer aggregates against.
//!
//! Every `analyze` function here is pure: `(frame, state) -> (result,
//! new_state)`. Nothing in this crate reads an ambient clock beyond the
//! `timestampMs` the caller passes in explicitly, and an analyzer never
//! panics on a malformed or invalid-pose frame — it degrades to an
//! all-warning, zero-score result instead.

pub mod exercises;
pub mod feedback;
pub mod phase;
pub mod raw_angles;
pub mod subanalyzers;
pub mod velocity_angle;

pub use feedback::{classify_level, composite_score, item_score, round_composite, Band, Correction, FeedbackItem, Level};
pub use phase::GenericPhase;
pub use raw_angles::{RawAngleSample, RawAngles};
pub use velocity_angle::{
    apply_tempo_multiplier, classify_movement_quality, classify_velocity_category, mean_abs_velocity,
    risk_correlation, tempo_multiplier, MovementPhase, MovementQuality, RiskCorrelation, VelocityCategory,
};
