//! Player: per-entity playback state machine.
//!
//! Methods:
//! - initialize, tick (activation → queue pickup → scrub or timed step)
//! - play / play_with (hard cut or transition bridge), hotswap
//! - queue_animation / clear_queue, add_event / remove_event, range value

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::active::{ActiveClip, BridgeClip};
use crate::advance::{advance_frame, range_frame, Cursor, Direction, Step};
use crate::clip::{Clip, PlaybackStyle};
use crate::config::Config;
use crate::error::AnimatorError;
use crate::events::{EventCommand, EventContext, EventTable};
use crate::frame::FrameHandle;
use crate::ids::{ClipId, EventHandle, IdAllocator};
use crate::outputs::{Outputs, PlayerEvent};

/// Discrete sprite animation player for one animated entity.
///
/// Single-threaded: the host calls [`Player::tick`] once per frame and may
/// call the other public methods between ticks.
pub struct Player {
    cfg: Config,
    rng: Box<dyn RngCore>,
    ids: IdAllocator,

    starting: Option<Arc<Clip>>,
    initialized: bool,

    active: Option<ActiveClip>,
    frame_index: usize,
    elapsed_in_frame: f32,
    elapsed_in_clip: f32,
    seconds_per_frame: f32,
    normalized_time: f32,
    direction: Direction,
    playing: bool,
    range_value: f32,

    queue: VecDeque<Arc<Clip>>,
    events: EventTable,
    commands: Vec<EventCommand>,
    dispatch_depth: Rc<Cell<u32>>,

    // Signals raised since the last tick returned.
    signals: Vec<PlayerEvent>,
    outputs: Outputs,
}

impl Player {
    /// Create a player; the random source is seeded from `cfg.seed` when set.
    pub fn new(cfg: Config) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(cfg, rng)
    }

    /// Create a player drawing `Random` style frames from `rng`.
    pub fn with_rng(cfg: Config, rng: impl RngCore + 'static) -> Self {
        Self {
            rng: Box::new(rng),
            ids: IdAllocator::new(),
            starting: None,
            initialized: false,
            active: None,
            frame_index: 0,
            elapsed_in_frame: 0.0,
            elapsed_in_clip: 0.0,
            seconds_per_frame: 0.0,
            normalized_time: 0.0,
            direction: Direction::Forward,
            playing: false,
            range_value: 0.0,
            queue: VecDeque::with_capacity(cfg.queue_capacity),
            events: EventTable::new(),
            commands: Vec::new(),
            dispatch_depth: Rc::new(Cell::new(0)),
            signals: Vec::new(),
            outputs: Outputs::default(),
            cfg,
        }
    }

    /// Clip made current by [`Player::initialize`] (or the first tick).
    pub fn with_starting_clip(mut self, clip: Arc<Clip>) -> Self {
        self.starting = Some(clip);
        self
    }

    pub fn set_starting_clip(&mut self, clip: Option<Arc<Clip>>) {
        self.starting = clip;
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Activate the starting clip, if one was configured. Runs once; later calls are no-ops.
    pub fn initialize(&mut self) -> Result<(), AnimatorError> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        match self.starting.take() {
            Some(clip) => self.set_animation(ActiveClip::Authored(clip)),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Play `clip` unless it is already the current (or pending) clip.
    pub fn play(&mut self, clip: Arc<Clip>) -> Result<(), AnimatorError> {
        self.play_with(clip, false)
    }

    /// Play `clip`; with `cancel_self` a clip that is already current restarts.
    ///
    /// When the current authored clip defines a transition to `clip`, its
    /// bridge plays first. Requesting the target of an in-flight bridge is a
    /// no-op; any other request while bridging cuts straight to the new clip.
    pub fn play_with(&mut self, clip: Arc<Clip>, cancel_self: bool) -> Result<(), AnimatorError> {
        match &self.active {
            Some(ActiveClip::Bridge(bridge)) if bridge.target().id == clip.id => return Ok(()),
            Some(ActiveClip::Authored(current)) if current.id == clip.id && !cancel_self => {
                return Ok(())
            }
            _ => {}
        }
        clip.validate()?;

        let bridge = match &self.active {
            Some(ActiveClip::Authored(current)) => current
                .transition_index(clip.id)
                .map(|index| BridgeClip::new(Arc::clone(current), index, Arc::clone(&clip))),
            _ => None,
        };
        match bridge {
            Some(bridge) => self.set_animation(ActiveClip::Bridge(bridge)),
            None => self.set_animation(ActiveClip::Authored(clip)),
        }
    }

    /// Swap the active clip for a structurally equivalent one without resetting playback.
    ///
    /// Frame index, timers and direction carry over. Refused when the clip
    /// lengths differ, since indices would no longer line up in time.
    pub fn hotswap(&mut self, clip: Arc<Clip>) -> Result<(), AnimatorError> {
        let current_length = match &self.active {
            None => return Err(AnimatorError::NoActiveClip),
            Some(ActiveClip::Bridge(_)) => return Err(AnimatorError::HotswapDuringTransition),
            Some(ActiveClip::Authored(current)) => current.length(),
        };
        clip.validate()?;
        let requested = clip.length();
        if (current_length - requested).abs() > self.cfg.length_tolerance {
            log::warn!(
                "hotswap to '{}' refused: length {requested}s != {current_length}s",
                clip.name
            );
            return Err(AnimatorError::LengthMismatch {
                current: current_length,
                requested,
            });
        }
        log::debug!("hotswap to '{}' at frame {}", clip.name, self.frame_index);
        self.seconds_per_frame = seconds_per_frame(clip.style, clip.frame_rate);
        self.frame_index = self.frame_index.min(clip.frame_count() - 1);
        self.active = Some(ActiveClip::Authored(clip));
        Ok(())
    }

    /// Append a clip to play once the current one finishes.
    pub fn queue_animation(&mut self, clip: Arc<Clip>) {
        self.queue.push_back(clip);
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn queued(&self) -> impl Iterator<Item = &Arc<Clip>> {
        self.queue.iter()
    }

    #[inline]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Run `callback` every time frame `frame` of `clip` becomes current.
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
        self.events
            .insert(handle, clip, frame, tag.into(), Box::new(callback));
        handle
    }

    /// Unregister an event before the next frame evaluation. Unknown handles are ignored.
    pub fn remove_event(&mut self, handle: EventHandle) {
        self.events.remove(handle);
    }

    #[inline]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn has_event(&self, handle: EventHandle) -> bool {
        self.events.contains(handle)
    }

    /// External scrub position, consumed only by `Range` clips.
    pub fn set_range_value(&mut self, value: f32) {
        self.range_value = value;
    }

    #[inline]
    pub fn range_value(&self) -> f32 {
        self.range_value
    }

    /// Clip being displayed: an authored clip or a transition bridge.
    #[inline]
    pub fn current_clip(&self) -> Option<&ActiveClip> {
        self.active.as_ref()
    }

    /// Id of the current authored clip; `None` while bridging or idle.
    #[inline]
    pub fn current_clip_id(&self) -> Option<ClipId> {
        self.active.as_ref().and_then(ActiveClip::id)
    }

    /// Clip a bridge is leading to.
    pub fn pending_target(&self) -> Option<&Arc<Clip>> {
        self.active
            .as_ref()
            .and_then(ActiveClip::bridge)
            .map(BridgeClip::target)
    }

    #[inline]
    pub fn current_frame(&self) -> usize {
        self.frame_index
    }

    pub fn current_frame_handle(&self) -> Option<&FrameHandle> {
        self.active
            .as_ref()
            .and_then(|active| active.frames().get(self.frame_index))
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Seconds since the current clip started.
    #[inline]
    pub fn animation_time(&self) -> f32 {
        self.elapsed_in_clip
    }

    /// Elapsed time over clip length; for `Range` clips the scrub position in [0, 1].
    #[inline]
    pub fn normalized_time(&self) -> f32 {
        self.normalized_time
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advance playback by `dt` seconds and report the frame to display.
    ///
    /// Never fails: problems met while stepping (an invalid queued clip, a
    /// failing callback) are logged and reported through [`Outputs::events`].
    pub fn tick(&mut self, dt: f32) -> &Outputs {
        // 1) First tick activates the starting clip
        if !self.initialized {
            let had_starting = self.starting.is_some();
            if let Err(err) = self.initialize() {
                self.report(err);
            }
            // The activation tick consumes no playback time.
            if had_starting {
                return self.flush_outputs();
            }
        }

        // 2) A stopped player picks up queued work
        if !self.playing {
            if let Some(next) = self.queue.pop_front() {
                self.start_queued(next);
            }
        }

        let Some((style, length)) = self.active.as_ref().map(|a| (a.style(), a.length())) else {
            return self.flush_outputs();
        };

        // 3) Range clips follow the scrub value; no timers, no events
        if style == PlaybackStyle::Range {
            self.scrub();
            return self.flush_outputs();
        }
        if !self.playing {
            return self.flush_outputs();
        }

        // 4) Timed playback: one frame step at most per tick
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed_in_frame += dt;
        self.elapsed_in_clip += dt;
        self.normalized_time = if length > 0.0 {
            self.elapsed_in_clip / length
        } else {
            0.0
        };

        if self.elapsed_in_frame > self.seconds_per_frame {
            self.step_frame();
        }
        self.flush_outputs()
    }

    fn step_frame(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let clip = active.id();
        let style = active.style();
        let frame_count = active.frame_count();
        let cursor = Cursor {
            frame_index: self.frame_index,
            frame_count,
            direction: self.direction,
            looping: active.looping(),
            queue_pending: !self.queue.is_empty(),
        };

        match advance_frame(
            style,
            cursor,
            &mut self.rng,
            self.cfg.random_includes_last_frame,
        ) {
            Step::Moved {
                frame_index,
                direction,
            } => {
                log::trace!("{style:?} step {} -> {frame_index}", self.frame_index);
                self.elapsed_in_frame = 0.0;
                self.direction = direction;
                self.frame_index = frame_index.min(frame_count.saturating_sub(1));
                self.signals.push(PlayerEvent::FrameEntered {
                    clip,
                    frame: self.frame_index,
                });
                self.fire_frame_events(self.frame_index);
            }
            Step::Stopped => {
                self.playing = false;
                if let Some(clip) = clip {
                    log::debug!("{clip} finished on frame {}", self.frame_index);
                    self.signals.push(PlayerEvent::ClipFinished { clip });
                }
            }
            Step::Dequeue => {
                if let Some(next) = self.queue.pop_front() {
                    self.start_queued(next);
                }
            }
            Step::FinishBridge => self.finish_bridge(),
        }
    }

    fn scrub(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let sample = range_frame(self.range_value, active.range(), active.frame_count());
        self.range_value = sample.clamped;
        self.frame_index = sample.frame_index;
        self.normalized_time = sample.normalized;
    }

    fn start_queued(&mut self, next: Arc<Clip>) {
        let id = next.id;
        log::debug!("dequeued '{}' ({id})", next.name);
        match self.play_with(next, true) {
            Ok(()) => self.signals.push(PlayerEvent::QueueAdvanced { clip: id }),
            Err(err) => {
                // Keep the current frame's timing; the boundary was already consumed.
                self.elapsed_in_frame = 0.0;
                self.report(err);
            }
        }
    }

    fn finish_bridge(&mut self) {
        let target = match &self.active {
            Some(ActiveClip::Bridge(bridge)) => Arc::clone(bridge.target()),
            _ => return,
        };
        log::debug!("transition into '{}' complete", target.name);
        self.signals
            .push(PlayerEvent::TransitionFinished { to: target.id });
        if let Err(err) = self.set_animation(ActiveClip::Authored(target)) {
            self.playing = false;
            self.report(err);
        }
    }

    /// Make `active` current at frame 0 and fire its frame-0 events.
    fn set_animation(&mut self, active: ActiveClip) -> Result<(), AnimatorError> {
        match &active {
            ActiveClip::Authored(clip) => clip.validate()?,
            ActiveClip::Bridge(bridge) => bridge.transition().validate(bridge.source().id)?,
        }

        match &active {
            ActiveClip::Authored(clip) => {
                log::debug!("start '{}' ({})", clip.name, clip.id);
                self.signals.push(PlayerEvent::ClipStarted { clip: clip.id });
            }
            ActiveClip::Bridge(bridge) => {
                log::debug!(
                    "bridge '{}' -> '{}'",
                    bridge.source().name,
                    bridge.target().name
                );
                self.signals.push(PlayerEvent::TransitionStarted {
                    from: bridge.source().id,
                    to: bridge.target().id,
                });
            }
        }

        self.seconds_per_frame = seconds_per_frame(active.style(), active.frame_rate());
        self.signals.push(PlayerEvent::FrameEntered {
            clip: active.id(),
            frame: 0,
        });
        self.active = Some(active);
        self.frame_index = 0;
        self.elapsed_in_frame = 0.0;
        self.elapsed_in_clip = 0.0;
        self.normalized_time = 0.0;
        self.direction = Direction::Forward;
        self.playing = true;

        self.fire_frame_events(0);
        Ok(())
    }

    /// Dispatch callbacks for `(current clip, frame)` and apply what they requested.
    fn fire_frame_events(&mut self, frame: usize) {
        let Some(clip) = self.current_clip_id() else {
            return;
        };
        let depth = self.dispatch_depth.get();
        if depth >= self.cfg.max_dispatch_depth {
            log::warn!(
                "skipping events for {clip} frame {frame}: dispatch depth {depth} reached"
            );
            return;
        }

        let _depth = DepthGuard::enter(&self.dispatch_depth);
        self.events.dispatch(
            clip,
            frame,
            &mut self.ids,
            &mut self.commands,
            &mut self.signals,
        );
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: EventCommand) {
        match command {
            EventCommand::Play { clip, cancel_self } => {
                if let Err(err) = self.play_with(clip, cancel_self) {
                    self.report(err);
                }
            }
            EventCommand::Queue(clip) => self.queue_animation(clip),
            EventCommand::ClearQueue => self.clear_queue(),
            EventCommand::AddEvent {
                handle,
                clip,
                frame,
                tag,
                callback,
            } => self.events.insert(handle, clip, frame, tag, callback),
            EventCommand::RemoveEvent(handle) => self.events.remove(handle),
            EventCommand::SetRangeValue(value) => self.range_value = value,
        }
    }

    fn report(&mut self, err: AnimatorError) {
        log::warn!("{} error: {err}", err.category());
        self.signals.push(PlayerEvent::Error {
            message: err.to_string(),
        });
    }

    fn flush_outputs(&mut self) -> &Outputs {
        let frame = self.current_frame_handle().cloned();
        self.outputs.clear();
        self.outputs.frame = frame;
        self.outputs.frame_index = self.frame_index;
        self.outputs.events.append(&mut self.signals);
        &self.outputs
    }
}

/// Holds one level of callback nesting; released on drop, including unwinds
/// out of a panicking callback.
struct DepthGuard(Rc<Cell<u32>>);

impl DepthGuard {
    fn enter(depth: &Rc<Cell<u32>>) -> Self {
        depth.set(depth.get() + 1);
        Self(Rc::clone(depth))
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

fn seconds_per_frame(style: PlaybackStyle, frame_rate: f32) -> f32 {
    if style.is_timed() && frame_rate > 0.0 {
        1.0 / frame_rate
    } else {
        0.0
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("active", &self.active)
            .field("frame_index", &self.frame_index)
            .field("elapsed_in_frame", &self.elapsed_in_frame)
            .field("elapsed_in_clip", &self.elapsed_in_clip)
            .field("direction", &self.direction)
            .field("playing", &self.playing)
            .field("range_value", &self.range_value)
            .field("queue", &self.queue.len())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
