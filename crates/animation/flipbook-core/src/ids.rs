//! Identifiers and simple allocators for clips and frame events.

use serde::{Deserialize, Serialize};

/// Identity of an authored clip. Two clips are "the same clip" iff their ids match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ClipId(pub u32);

/// Handle returned by `Player::add_event`, used to remove the registration later.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EventHandle(pub u64);

/// Monotonic allocator for ClipId and EventHandle.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_clip: u32,
    next_event: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_clip(&mut self) -> ClipId {
        let id = ClipId(self.next_clip);
        self.next_clip = self.next_clip.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_event(&mut self) -> EventHandle {
        let id = EventHandle(self.next_event);
        self.next_event = self.next_event.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_clip(), ClipId(0));
        assert_eq!(alloc.alloc_clip(), ClipId(1));
        assert_eq!(alloc.alloc_event(), EventHandle(0));
        assert_eq!(alloc.alloc_event(), EventHandle(1));
        alloc.reset();
        assert_eq!(alloc.alloc_clip(), ClipId(0));
    }
}
