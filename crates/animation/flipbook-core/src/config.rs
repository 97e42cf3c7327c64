//! Player configuration.

use serde::{Deserialize, Serialize};

/// Tunables for one `Player`.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the default random source used by `Random` style.
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// `Random` style picks from every frame instead of `0..count-1`.
    pub random_includes_last_frame: bool,

    /// How deeply callbacks may re-enter playback (a callback calling `play`
    /// enters frame 0, which may fire further callbacks).
    pub max_dispatch_depth: u32,

    /// Seconds of slack allowed when comparing clip lengths for hotswap.
    pub length_tolerance: f32,

    /// Initial capacity hint for the clip queue.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            random_includes_last_frame: false,
            max_dispatch_depth: 8,
            length_tolerance: 1e-5,
            queue_capacity: 4,
        }
    }
}
