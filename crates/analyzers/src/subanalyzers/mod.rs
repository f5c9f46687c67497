//! Shared sub-analyzers composed by the five exercise analyzers (L2).

pub mod coordination;
pub mod hip_hinge;
pub mod knee_alignment;
pub mod neck;
pub mod pelvic_tilt;
pub mod torso_rotation;

pub use coordination::{
    analyze_coordination, CoordinationMeasurement, CoordinationPattern, CoordinationState,
    LeadJoint, OptimalRatioBand, DEADLIFT_OPTIMAL_RATIO, LUNGE_OPTIMAL_RATIO, SQUAT_OPTIMAL_RATIO,
};
pub use hip_hinge::{analyze_hip_hinge, HipHingeMeasurement, HipHingeState, InitiationPattern};
pub use knee_alignment::{
    analyze_knee_alignment, KneeAlignmentClass, KneeAlignmentMeasurement, KneeAlignmentState,
};
pub use neck::{calculate_neck_alignment, NeckMeasurement};
pub use pelvic_tilt::{analyze_pelvic_tilt, PelvicTiltMeasurement, PelvicTiltState};
pub use torso_rotation::{
    calculate_torso_rotation_measurement, classify_rotation_level, FrontalDirection,
    TorsoRotationMeasurement,
};
