//! Error taxonomy for the mapping engine.
//!
//! Only [`EngineError`] is ever returned to callers, and only from
//! construction.  [`FeatureError`] is a per-frame condition: the engine
//! records it in the [`StepReport`](crate::StepReport) and carries on.

use thiserror::Error;

/// Configuration rejected while building a [`MappingEngine`](crate::MappingEngine).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("duplicate channel id: {0}")]
    DuplicateChannel(String),

    #[error("channel {channel}: unknown feature kind {kind:?}")]
    UnknownFeatureKind { channel: String, kind: String },

    #[error("channel {channel}: feature {kind} takes {expected} point ref(s), got {got}")]
    PointRefCount { channel: String, kind: String, expected: usize, got: usize },

    #[error("channel {channel}: domain range is empty ({min} == {max})")]
    DegenerateDomain { channel: String, min: f64, max: f64 },

    #[error("channel {channel}: {what} must be finite")]
    NonFinite { channel: String, what: &'static str },

    #[error("channel {channel}: output bound {value} outside 0..=127")]
    OutputOutOfRange { channel: String, value: f64 },

    #[error("channel {channel}: decay time must be positive, got {seconds}")]
    InvalidDecay { channel: String, seconds: f64 },

    #[error("channel id must not be empty")]
    EmptyChannelId,
}

/// A feature could not be computed from this frame's landmarks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("missing required landmark {0:?}")]
    MissingRequiredLandmark(String),
}
