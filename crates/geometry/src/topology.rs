//! The fixed body topology: which index in a [`crate::LandmarkFrame`]
//! corresponds to which named point.

use strum::{EnumIter, FromRepr};

/// Number of landmarks in every frame. Fixed by the topology, never runtime
/// data.
pub const NUM_LANDMARKS: usize = 33;

/// Named indices into a [`crate::LandmarkFrame`], in the order the inference
/// layer emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    #[must_use]
    pub const fn idx(self) -> usize {
        self as usize
    }
}

impl From<LandmarkIndex> for usize {
    fn from(value: LandmarkIndex) -> Self {
        value.idx()
    }
}
