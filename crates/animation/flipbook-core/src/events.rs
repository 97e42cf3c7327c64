//! Frame-entry events.
//!
//! Callbacks are registered against a (clip, frame) pair and run inline when
//! that pair becomes current. Removals go to a shadow set that is applied at
//! the start of the next dispatch, so the live table is never mutated while it
//! is being iterated. Callbacks cannot borrow the player; instead they record
//! [`EventCommand`]s through the [`EventContext`] they receive, and the player
//! applies those right after the dispatch finishes.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::clip::Clip;
use crate::ids::{ClipId, EventHandle, IdAllocator};
use crate::outputs::PlayerEvent;

pub type EventCallback = dyn FnMut(&mut EventContext<'_>) -> anyhow::Result<()>;

struct EventEntry {
    clip: ClipId,
    frame: usize,
    tag: String,
    callback: Box<EventCallback>,
}

/// Deferred player mutation requested from inside a callback.
pub enum EventCommand {
    Play {
        clip: Arc<Clip>,
        cancel_self: bool,
    },
    Queue(Arc<Clip>),
    ClearQueue,
    AddEvent {
        handle: EventHandle,
        clip: ClipId,
        frame: usize,
        tag: String,
        callback: Box<EventCallback>,
    },
    RemoveEvent(EventHandle),
    SetRangeValue(f32),
}

impl std::fmt::Debug for EventCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Play { clip, cancel_self } => f
                .debug_struct("Play")
                .field("clip", &clip.id)
                .field("cancel_self", cancel_self)
                .finish(),
            Self::Queue(clip) => f.debug_tuple("Queue").field(&clip.id).finish(),
            Self::ClearQueue => f.write_str("ClearQueue"),
            Self::AddEvent {
                handle,
                clip,
                frame,
                tag,
                ..
            } => f
                .debug_struct("AddEvent")
                .field("handle", handle)
                .field("clip", clip)
                .field("frame", frame)
                .field("tag", tag)
                .finish_non_exhaustive(),
            Self::RemoveEvent(handle) => f.debug_tuple("RemoveEvent").field(handle).finish(),
            Self::SetRangeValue(value) => f.debug_tuple("SetRangeValue").field(value).finish(),
        }
    }
}

/// What a running callback can see and request.
pub struct EventContext<'a> {
    handle: EventHandle,
    tag: &'a str,
    clip: ClipId,
    frame: usize,
    ids: &'a mut IdAllocator,
    commands: &'a mut Vec<EventCommand>,
}

impl<'a> EventContext<'a> {
    #[inline]
    pub fn handle(&self) -> EventHandle {
        self.handle
    }

    #[inline]
    pub fn tag(&self) -> &str {
        self.tag
    }

    #[inline]
    pub fn clip(&self) -> ClipId {
        self.clip
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn play(&mut self, clip: Arc<Clip>) {
        self.commands.push(EventCommand::Play {
            clip,
            cancel_self: false,
        });
    }

    pub fn play_with(&mut self, clip: Arc<Clip>, cancel_self: bool) {
        self.commands.push(EventCommand::Play { clip, cancel_self });
    }

    pub fn queue_animation(&mut self, clip: Arc<Clip>) {
        self.commands.push(EventCommand::Queue(clip));
    }

    pub fn clear_queue(&mut self) {
        self.commands.push(EventCommand::ClearQueue);
    }

    /// Register another event; the handle is valid immediately.
    pub fn add_event<F>(
        &mut self,
        clip: ClipId,
        frame: usize,
        tag: impl Into<String>,
        callback: F,
    ) -> EventHandle
    where
        F: FnMut(&mut EventContext<'_>) -> anyhow::Result<()> + 'static,
    {
        let handle = self.ids.alloc_event();
        self.commands.push(EventCommand::AddEvent {
            handle,
            clip,
            frame,
            tag: tag.into(),
            callback: Box::new(callback),
        });
        handle
    }

    pub fn remove_event(&mut self, handle: EventHandle) {
        self.commands.push(EventCommand::RemoveEvent(handle));
    }

    /// Unregister the running callback; the current firing still completes.
    pub fn remove_self(&mut self) {
        let handle = self.handle;
        self.remove_event(handle);
    }

    pub fn set_range_value(&mut self, value: f32) {
        self.commands.push(EventCommand::SetRangeValue(value));
    }
}

/// Live registrations plus the deferred-removal shadow set.
#[derive(Default)]
pub struct EventTable {
    live: HashMap<EventHandle, EventEntry>,
    removals: HashSet<EventHandle>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        handle: EventHandle,
        clip: ClipId,
        frame: usize,
        tag: String,
        callback: Box<EventCallback>,
    ) {
        self.live.insert(
            handle,
            EventEntry {
                clip,
                frame,
                tag,
                callback,
            },
        );
    }

    /// Schedule removal; unknown handles are ignored.
    pub(crate) fn remove(&mut self, handle: EventHandle) {
        if self.live.contains_key(&handle) {
            self.removals.insert(handle);
        }
    }

    pub(crate) fn apply_removals(&mut self) {
        for handle in self.removals.drain() {
            self.live.remove(&handle);
        }
    }

    /// Registrations that will still be evaluated at the next dispatch.
    pub fn len(&self) -> usize {
        self.live
            .keys()
            .filter(|h| !self.removals.contains(*h))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, handle: EventHandle) -> bool {
        self.live.contains_key(&handle) && !self.removals.contains(&handle)
    }

    /// Run every callback registered for `(clip, frame)`.
    ///
    /// A failing callback is reported and does not stop the others. Returns the
    /// number of callbacks invoked.
    pub(crate) fn dispatch(
        &mut self,
        clip: ClipId,
        frame: usize,
        ids: &mut IdAllocator,
        commands: &mut Vec<EventCommand>,
        signals: &mut Vec<PlayerEvent>,
    ) -> usize {
        self.apply_removals();
        let mut invoked = 0;
        for (handle, entry) in self.live.iter_mut() {
            if entry.clip != clip || entry.frame != frame {
                continue;
            }
            let EventEntry { tag, callback, .. } = entry;
            let mut ctx = EventContext {
                handle: *handle,
                tag: tag.as_str(),
                clip,
                frame,
                ids: &mut *ids,
                commands: &mut *commands,
            };
            invoked += 1;
            match callback(&mut ctx) {
                Ok(()) => signals.push(PlayerEvent::EventFired {
                    handle: *handle,
                    tag: tag.clone(),
                }),
                Err(err) => {
                    log::warn!("event '{tag}' on {clip} frame {frame} failed: {err:#}");
                    signals.push(PlayerEvent::CallbackFailed {
                        handle: *handle,
                        tag: tag.clone(),
                        message: format!("{err:#}"),
                    });
                }
            }
        }
        invoked
    }
}

impl std::fmt::Debug for EventTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTable")
            .field("live", &self.live.len())
            .field("removals", &self.removals.len())
            .finish()
    }
}
