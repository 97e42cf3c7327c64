//! Output contracts from the player.
//!
//! Outputs carry the frame a renderer should display after this tick and a
//! list of semantic signals. Hosts apply the frame and transport the signals.

use serde::{Deserialize, Serialize};

use crate::frame::FrameHandle;
use crate::ids::{ClipId, EventHandle};

/// Discrete semantic signals emitted while stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerEvent {
    /// An authored clip became current at frame 0.
    ClipStarted {
        clip: ClipId,
    },
    /// A bridge from `from` towards `to` became current.
    TransitionStarted {
        from: ClipId,
        to: ClipId,
    },
    /// The bridge towards `to` consumed its last frame.
    TransitionFinished {
        to: ClipId,
    },
    /// A clip or bridge became current at `frame`, either by starting or by
    /// a timed step. `clip` is `None` on bridge frames.
    FrameEntered {
        clip: Option<ClipId>,
        frame: usize,
    },
    /// A non-looping clip stopped on its last frame.
    ClipFinished {
        clip: ClipId,
    },
    /// A queued clip was taken off the queue and started.
    QueueAdvanced {
        clip: ClipId,
    },
    EventFired {
        handle: EventHandle,
        tag: String,
    },
    CallbackFailed {
        handle: EventHandle,
        tag: String,
        message: String,
    },
    Error {
        message: String,
    },
}

/// Outputs returned by `Player::tick()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    /// Frame to display, `None` until a clip is active.
    #[serde(default)]
    pub frame: Option<FrameHandle>,
    #[serde(default)]
    pub frame_index: usize,
    #[serde(default)]
    pub events: Vec<PlayerEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.frame = None;
        self.frame_index = 0;
        self.events.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame.is_none() && self.events.is_empty()
    }

    /// Tags of every callback fired during the tick, in firing order.
    pub fn fired_tags(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            PlayerEvent::EventFired { tag, .. } => Some(tag.as_str()),
            _ => None,
        })
    }
}
