//! Clip library: authoring-time storage for shared clips.
//!
//! Clips are handed to players as `Arc<Clip>`. Attaching a transition after a
//! clip has been handed out copies it on write, so players that already hold
//! the old `Arc` keep seeing an unchanged clip.

use std::sync::Arc;

use crate::clip::{Clip, Transition};
use crate::error::AnimatorError;
use crate::ids::{ClipId, IdAllocator};

#[derive(Default, Debug)]
pub struct ClipLibrary {
    ids: IdAllocator,
    items: Vec<Arc<Clip>>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id ahead of building the clip (lets clips reference each other).
    #[inline]
    pub fn alloc_id(&mut self) -> ClipId {
        self.ids.alloc_clip()
    }

    /// Store a clip, replacing any clip already stored under the same id.
    pub fn insert(&mut self, clip: Clip) -> Arc<Clip> {
        let clip = Arc::new(clip);
        match self.items.iter_mut().find(|c| c.id == clip.id) {
            Some(slot) => *slot = Arc::clone(&clip),
            None => self.items.push(Arc::clone(&clip)),
        }
        clip
    }

    pub fn get(&self, id: ClipId) -> Option<Arc<Clip>> {
        self.items.iter().find(|c| c.id == id).cloned()
    }

    /// Attach a bridge from `from` to `transition.target`; returns the updated clip.
    pub fn add_transition(
        &mut self,
        from: ClipId,
        transition: Transition,
    ) -> Result<Arc<Clip>, AnimatorError> {
        if !self.items.iter().any(|c| c.id == transition.target) {
            return Err(AnimatorError::ClipNotFound {
                id: transition.target,
            });
        }
        transition.validate(from)?;
        let slot = self
            .items
            .iter_mut()
            .find(|c| c.id == from)
            .ok_or(AnimatorError::ClipNotFound { id: from })?;
        if slot.find_transition(transition.target).is_some() {
            return Err(AnimatorError::DuplicateTransition {
                from,
                to: transition.target,
            });
        }
        Arc::make_mut(slot).transitions.push(transition);
        Ok(Arc::clone(slot))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Clip>> {
        self.items.iter()
    }
}
