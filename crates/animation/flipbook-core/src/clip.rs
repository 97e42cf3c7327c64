//! Canonical clip data model.
//!
//! A `Clip` is authored once and then shared read-only (`Arc<Clip>`) by any
//! number of players. Transitions are keyed by the target clip's id, so two
//! clips may bridge into each other without forming reference cycles.

use serde::{Deserialize, Serialize};

use crate::error::AnimatorError;
use crate::frame::FrameHandle;
use crate::ids::ClipId;

/// How the frame index evolves over time.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PlaybackStyle {
    #[default]
    Normal,
    PingPong,
    Random,
    /// Frame chosen from an external scrub value rather than elapsed time.
    Range,
    /// Reserved for bridges synthesized by the player; never authored.
    #[serde(skip)]
    Transition,
}

impl PlaybackStyle {
    /// Styles driven by elapsed time (everything except `Range`).
    #[inline]
    pub fn is_timed(&self) -> bool {
        !matches!(self, Self::Range)
    }
}

/// Scrub bounds for `PlaybackStyle::Range`. `start` may exceed `end`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub start: f32,
    pub end: f32,
    #[serde(default)]
    pub invert: bool,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            invert: false,
        }
    }
}

impl RangeSpec {
    /// Ordered bounds `(min, max)`.
    #[inline]
    pub fn bounds(&self) -> (f32, f32) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// Authored bridging animation played between the owning clip and `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub target: ClipId,
    pub frames: Vec<FrameHandle>,
    #[serde(rename = "frameRate")]
    pub frame_rate: f32,
}

impl Transition {
    pub fn new(target: ClipId, frames: Vec<FrameHandle>, frame_rate: f32) -> Self {
        Self {
            target,
            frames,
            frame_rate,
        }
    }

    /// A bridge needs at least one frame and a positive rate.
    pub fn validate(&self, owner: ClipId) -> Result<(), AnimatorError> {
        if self.frames.is_empty() {
            return Err(AnimatorError::InvalidClip {
                clip: Some(owner),
                reason: format!("transition to {} has no frames", self.target),
            });
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(AnimatorError::InvalidConfiguration {
                clip: Some(owner),
                reason: format!(
                    "transition to {} has frame rate {}",
                    self.target, self.frame_rate
                ),
            });
        }
        Ok(())
    }
}

/// One authored sprite-sheet animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    pub frames: Vec<FrameHandle>,
    /// Frames per second; ignored by `Range` style.
    #[serde(rename = "frameRate")]
    pub frame_rate: f32,
    #[serde(default)]
    pub style: PlaybackStyle,
    /// Meaningless for `Range` style.
    #[serde(default = "default_looping")]
    pub looping: bool,
    #[serde(default)]
    pub range: RangeSpec,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

fn default_looping() -> bool {
    true
}

impl Clip {
    /// New looping `Normal` clip.
    pub fn new(
        id: ClipId,
        name: impl Into<String>,
        frames: Vec<FrameHandle>,
        frame_rate: f32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            frames,
            frame_rate,
            style: PlaybackStyle::Normal,
            looping: true,
            range: RangeSpec::default(),
            transitions: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: PlaybackStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_range(mut self, start: f32, end: f32, invert: bool) -> Self {
        self.style = PlaybackStyle::Range;
        self.range = RangeSpec { start, end, invert };
        self
    }

    /// Adds (or replaces) the bridge leading to `transition.target`.
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.retain(|t| t.target != transition.target);
        self.transitions.push(transition);
        self
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Duration in seconds: `frame_count / frame_rate`, 0 when the rate is unusable.
    #[inline]
    pub fn length(&self) -> f32 {
        clip_length(self.frames.len(), self.frame_rate)
    }

    /// Linear lookup of the bridge leading to `target`.
    pub fn find_transition(&self, target: ClipId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.target == target)
    }

    pub(crate) fn transition_index(&self, target: ClipId) -> Option<usize> {
        self.transitions.iter().position(|t| t.target == target)
    }

    /// Validate the clip can be made current in a player.
    pub fn validate(&self) -> Result<(), AnimatorError> {
        if self.frames.is_empty() {
            return Err(AnimatorError::InvalidClip {
                clip: Some(self.id),
                reason: format!("clip '{}' has no frames", self.name),
            });
        }
        match self.style {
            PlaybackStyle::Transition => Err(AnimatorError::InvalidConfiguration {
                clip: Some(self.id),
                reason: "Transition style is reserved for player-synthesized bridges".into(),
            }),
            PlaybackStyle::Range => {
                if !self.range.start.is_finite() || !self.range.end.is_finite() {
                    return Err(AnimatorError::InvalidConfiguration {
                        clip: Some(self.id),
                        reason: format!(
                            "range bounds must be finite, got [{}, {}]",
                            self.range.start, self.range.end
                        ),
                    });
                }
                Ok(())
            }
            _ => {
                if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
                    return Err(AnimatorError::InvalidConfiguration {
                        clip: Some(self.id),
                        reason: format!("frame rate must be > 0, got {}", self.frame_rate),
                    });
                }
                Ok(())
            }
        }
    }
}

#[inline]
pub(crate) fn clip_length(frame_count: usize, frame_rate: f32) -> f32 {
    if frame_rate > 0.0 && frame_rate.is_finite() {
        frame_count as f32 / frame_rate
    } else {
        0.0
    }
}
