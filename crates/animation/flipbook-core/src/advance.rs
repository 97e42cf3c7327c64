//! Frame stepping per playback style.
//!
//! Everything here is a pure function of the playback position; the player
//! applies the returned [`Step`] to its own state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clip::{PlaybackStyle, RangeSpec};

/// Travel direction, only meaningful for `PingPong`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Position fed into [`advance_frame`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub frame_index: usize,
    pub frame_count: usize,
    pub direction: Direction,
    pub looping: bool,
    /// Whether the player has queued clips waiting.
    pub queue_pending: bool,
}

/// Outcome of one frame boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Stay in the current clip at a new index.
    Moved {
        frame_index: usize,
        direction: Direction,
    },
    /// Non-looping clip is done; the last frame stays on screen.
    Stopped,
    /// Current clip is on its last frame and the queue has work.
    Dequeue,
    /// Bridge consumed its last frame; switch to its target.
    FinishBridge,
}

/// Compute the next frame for `style`.
///
/// End-of-clip policy runs first for authored styles: on the last frame a
/// pending queue wins, otherwise a non-looping clip stops. Bridges ignore the
/// queue and always hand over to their target.
///
/// `Random` draws from `0..count-1` (the last frame is never picked) unless
/// `random_includes_last` is set.
pub fn advance_frame<R: Rng>(
    style: PlaybackStyle,
    cursor: Cursor,
    rng: &mut R,
    random_includes_last: bool,
) -> Step {
    let count = cursor.frame_count.max(1);
    let last = count - 1;
    let index = cursor.frame_index.min(last);

    if style == PlaybackStyle::Transition {
        return if index >= last {
            Step::FinishBridge
        } else {
            Step::Moved {
                frame_index: index + 1,
                direction: cursor.direction,
            }
        };
    }

    if index == last {
        if cursor.queue_pending {
            return Step::Dequeue;
        }
        if !cursor.looping {
            return Step::Stopped;
        }
    }

    match style {
        PlaybackStyle::Normal => Step::Moved {
            frame_index: (index + 1) % count,
            direction: cursor.direction,
        },
        PlaybackStyle::PingPong => ping_pong_step(index, last, cursor.direction),
        PlaybackStyle::Random => {
            let upper = if random_includes_last { count } else { last };
            let frame_index = if upper == 0 { 0 } else { rng.gen_range(0..upper) };
            Step::Moved {
                frame_index,
                direction: cursor.direction,
            }
        }
        // Range is scrubbed, not stepped; hold position.
        PlaybackStyle::Range | PlaybackStyle::Transition => Step::Moved {
            frame_index: index,
            direction: cursor.direction,
        },
    }
}

fn ping_pong_step(index: usize, last: usize, direction: Direction) -> Step {
    if last == 0 {
        return Step::Moved {
            frame_index: 0,
            direction,
        };
    }
    let next = (index as isize + direction.sign()).clamp(0, last as isize) as usize;
    let turn = match direction {
        Direction::Forward => next == last,
        Direction::Backward => next == 0,
    };
    Step::Moved {
        frame_index: next,
        direction: if turn { direction.flipped() } else { direction },
    }
}

/// Result of mapping a scrub value onto a `Range` clip.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangeSample {
    pub frame_index: usize,
    /// Position within the range in [0, 1] after inversion.
    pub normalized: f32,
    /// Input value clamped into the ordered bounds.
    pub clamped: f32,
}

/// Map an external scrub value onto a frame index.
pub fn range_frame(value: f32, range: RangeSpec, frame_count: usize) -> RangeSample {
    let (min, max) = range.bounds();
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    let width = max - min;
    let mut t = if width > 0.0 { (clamped - min) / width } else { 0.0 };
    if range.invert {
        t = 1.0 - t;
    }
    let last = frame_count.saturating_sub(1);
    let frame_index = ((t * frame_count as f32).floor() as usize).min(last);
    RangeSample {
        frame_index,
        normalized: t,
        clamped,
    }
}
