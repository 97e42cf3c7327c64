//! The clip a player is currently displaying.
//!
//! Either an authored clip or a bridge synthesized from one of its transitions.
//! A bridge always carries the clip it leads to, so "a pending target exists"
//! and "a bridge is playing" cannot disagree.

use std::sync::Arc;

use crate::clip::{clip_length, Clip, PlaybackStyle, RangeSpec, Transition};
use crate::frame::FrameHandle;
use crate::ids::ClipId;

/// Ephemeral clip owned by one player while it bridges two authored clips.
#[derive(Clone, Debug)]
pub struct BridgeClip {
    source: Arc<Clip>,
    index: usize,
    target: Arc<Clip>,
}

impl BridgeClip {
    /// `index` must name an entry of `source.transitions`.
    pub(crate) fn new(source: Arc<Clip>, index: usize, target: Arc<Clip>) -> Self {
        debug_assert!(index < source.transitions.len());
        Self {
            source,
            index,
            target,
        }
    }

    #[inline]
    pub fn transition(&self) -> &Transition {
        &self.source.transitions[self.index]
    }

    /// Clip the bridge was started from.
    #[inline]
    pub fn source(&self) -> &Arc<Clip> {
        &self.source
    }

    /// Clip that becomes current once the bridge's last frame is consumed.
    #[inline]
    pub fn target(&self) -> &Arc<Clip> {
        &self.target
    }
}

#[derive(Clone, Debug)]
pub enum ActiveClip {
    Authored(Arc<Clip>),
    Bridge(BridgeClip),
}

impl ActiveClip {
    /// Id of the authored clip; bridges have none.
    #[inline]
    pub fn id(&self) -> Option<ClipId> {
        match self {
            Self::Authored(clip) => Some(clip.id),
            Self::Bridge(_) => None,
        }
    }

    #[inline]
    pub fn bridge(&self) -> Option<&BridgeClip> {
        match self {
            Self::Authored(_) => None,
            Self::Bridge(bridge) => Some(bridge),
        }
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        matches!(self, Self::Bridge(_))
    }

    /// Display name; a bridge reports the clip it leads to.
    pub fn name(&self) -> &str {
        match self {
            Self::Authored(clip) => &clip.name,
            Self::Bridge(bridge) => &bridge.target.name,
        }
    }

    #[inline]
    pub fn frames(&self) -> &[FrameHandle] {
        match self {
            Self::Authored(clip) => &clip.frames,
            Self::Bridge(bridge) => &bridge.transition().frames,
        }
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames().len()
    }

    #[inline]
    pub fn frame_rate(&self) -> f32 {
        match self {
            Self::Authored(clip) => clip.frame_rate,
            Self::Bridge(bridge) => bridge.transition().frame_rate,
        }
    }

    #[inline]
    pub fn style(&self) -> PlaybackStyle {
        match self {
            Self::Authored(clip) => clip.style,
            Self::Bridge(_) => PlaybackStyle::Transition,
        }
    }

    /// Bridges never loop.
    #[inline]
    pub fn looping(&self) -> bool {
        match self {
            Self::Authored(clip) => clip.looping,
            Self::Bridge(_) => false,
        }
    }

    #[inline]
    pub fn range(&self) -> RangeSpec {
        match self {
            Self::Authored(clip) => clip.range,
            Self::Bridge(_) => RangeSpec::default(),
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        clip_length(self.frame_count(), self.frame_rate())
    }
}
