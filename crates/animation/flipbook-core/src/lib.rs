//! Flipbook Core (engine-agnostic)
//!
//! Discrete sprite-sheet animation playback. A [`Player`] steps through the
//! frames of an authored [`Clip`] according to its [`PlaybackStyle`], splices
//! in transition bridges between clips, fires per-frame callbacks and plays
//! queued clips in order. Rendering, asset loading and scene plumbing belong
//! to the host; the core only decides which frame is current.

pub mod active;
pub mod advance;
pub mod clip;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod ids;
pub mod library;
pub mod outputs;
pub mod player;

// Re-exports for consumers (adapters)
pub use active::{ActiveClip, BridgeClip};
pub use advance::{advance_frame, range_frame, Cursor, Direction, RangeSample, Step};
pub use clip::{Clip, PlaybackStyle, RangeSpec, Transition};
pub use config::Config;
pub use error::AnimatorError;
pub use events::{EventCallback, EventCommand, EventContext, EventTable};
pub use frame::{frames_from_sheet, FrameHandle};
pub use ids::{ClipId, EventHandle, IdAllocator};
pub use library::ClipLibrary;
pub use outputs::{Outputs, PlayerEvent};
pub use player::Player;

/// Flipbook result type
pub type Result<T> = core::result::Result<T, AnimatorError>;
