//! Error types for clip authoring and playback control

use serde::{Deserialize, Serialize};

use crate::ids::ClipId;

/// Errors surfaced by playback requests and clip authoring.
///
/// None of these are fatal: the player state is left untouched when a request fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimatorError {
    /// Clip cannot be displayed (no frames)
    #[error("Invalid clip {clip:?}: {reason}")]
    InvalidClip { clip: Option<ClipId>, reason: String },

    /// Clip timing or range parameters cannot drive playback
    #[error("Invalid configuration for clip {clip:?}: {reason}")]
    InvalidConfiguration { clip: Option<ClipId>, reason: String },

    /// Hotswap target does not have the same length as the active clip
    #[error("Hotswap refused: active clip lasts {current}s, requested clip lasts {requested}s")]
    LengthMismatch { current: f32, requested: f32 },

    /// Operation requires an active clip
    #[error("No active clip")]
    NoActiveClip,

    /// Hotswap is not possible while a transition bridge is playing
    #[error("Cannot hotswap while a transition is in progress")]
    HotswapDuringTransition,

    /// Clip id unknown to the library
    #[error("Clip not found: {id}")]
    ClipNotFound { id: ClipId },

    /// A transition to the same target already exists on the clip
    #[error("Clip {from} already defines a transition to {to}")]
    DuplicateTransition { from: ClipId, to: ClipId },
}

impl AnimatorError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidClip { .. } | Self::InvalidConfiguration { .. } => "validation",
            Self::LengthMismatch { .. } | Self::HotswapDuringTransition => "hotswap",
            Self::NoActiveClip => "player",
            Self::ClipNotFound { .. } | Self::DuplicateTransition { .. } => "library",
        }
    }
}
