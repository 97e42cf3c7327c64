//! Opaque frame references.
//!
//! The core never looks inside a frame; it only decides which one is current.
//! Hosts usually key frames by sprite-sheet region name.

use serde::{Deserialize, Serialize};

/// Opaque reference to one sprite-sheet cell (small string key).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FrameHandle(pub String);

impl FrameHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FrameHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FrameHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a clip's frame list from the sub-images of one sprite sheet.
///
/// Cells are ordered by name using plain ordinal string comparison, so
/// `run_10` sorts before `run_2`; pad indices when authoring sheets.
pub fn frames_from_sheet<I, F>(cells: I) -> Vec<FrameHandle>
where
    I: IntoIterator<Item = F>,
    F: Into<FrameHandle>,
{
    let mut frames: Vec<FrameHandle> = cells.into_iter().map(Into::into).collect();
    frames.sort();
    frames
}
