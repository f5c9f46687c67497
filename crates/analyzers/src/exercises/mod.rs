//! The five L3 exercise analyzers. Each exposes a pure
//! `analyze(frame, state) -> (result, state)` function plus a
//! `create_initial_state` constructor.

pub mod deadlift;
pub mod lunge;
pub mod plank;
pub mod pushup;
pub mod squat;
