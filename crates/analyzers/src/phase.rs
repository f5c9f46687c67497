//! The generic four-phase vocabulary every exercise phase maps onto for
//! rep segmentation.

/// Common phase label used by the L5 rep analyzer, regardless of which
/// exercise-specific phase produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenericPhase {
    Standing,
    Descending,
    Bottom,
    Ascending,
}
