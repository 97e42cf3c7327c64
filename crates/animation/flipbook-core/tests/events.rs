use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use flipbook_core::{Clip, ClipId, Config, FrameHandle, PlaybackStyle, Player, PlayerEvent};

const RATE: f32 = 10.0;
const STEP: f32 = 0.15;

fn frames(prefix: &str, n: usize) -> Vec<FrameHandle> {
    (0..n)
        .map(|i| FrameHandle::new(format!("{prefix}{i}")))
        .collect()
}

fn looping(id: u32, prefix: &str, n: usize) -> Arc<Clip> {
    Arc::new(Clip::new(ClipId(id), prefix, frames(prefix, n), RATE))
}

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

fn ticks(p: &mut Player, n: usize) {
    for _ in 0..n {
        p.tick(STEP);
    }
}

/// it should fire once per entry into the registered frame
#[test]
fn fires_once_per_entry() {
    let a = looping(0, "a", 4);
    let hits = counter();
    let mut p = Player::default();
    let h = Rc::clone(&hits);
    p.add_event(a.id, 2, "step", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });
    p.play(a).unwrap();

    ticks(&mut p, 2); // 1, 2
    assert_eq!(hits.get(), 1);
    ticks(&mut p, 4); // 3, 0, 1, 2
    assert_eq!(hits.get(), 2);
}

/// it should fire frame-0 events as soon as a clip starts
#[test]
fn frame_zero_fires_on_play() {
    let a = looping(0, "a", 3);
    let hits = counter();
    let mut p = Player::default();
    let h = Rc::clone(&hits);
    p.add_event(a.id, 0, "start", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });
    p.play(a).unwrap();
    assert_eq!(hits.get(), 1);

    let out = p.tick(0.01);
    assert_eq!(out.fired_tags().collect::<Vec<_>>(), vec!["start"]);
}

/// it should fire again after the clip is re-entered or restarted
#[test]
fn refires_after_replay_and_restart() {
    let a = looping(0, "a", 4);
    let b = looping(1, "b", 2);
    let hits = counter();
    let mut p = Player::default();
    let h = Rc::clone(&hits);
    p.add_event(a.id, 2, "step", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });

    p.play(Arc::clone(&a)).unwrap();
    ticks(&mut p, 2);
    assert_eq!(hits.get(), 1);

    p.play(Arc::clone(&b)).unwrap();
    p.play(Arc::clone(&a)).unwrap();
    ticks(&mut p, 2);
    assert_eq!(hits.get(), 2);

    // Replaying the current clip is a no-op and does not re-enter frame 2.
    p.play(Arc::clone(&a)).unwrap();
    assert_eq!(p.current_frame(), 2);
    assert_eq!(hits.get(), 2);

    p.play_with(Arc::clone(&a), true).unwrap();
    ticks(&mut p, 2);
    assert_eq!(hits.get(), 3);
}

/// it should finish the current firing but skip later ones after self-removal
#[test]
fn remove_self_inside_callback() {
    let a = looping(0, "a", 2);
    let hits = counter();
    let mut p = Player::default();
    let h = Rc::clone(&hits);
    let handle = p.add_event(a.id, 1, "once", move |ctx| {
        h.set(h.get() + 1);
        ctx.remove_self();
        Ok(())
    });
    p.play(a).unwrap();

    let out = p.tick(STEP);
    assert_eq!(out.fired_tags().collect::<Vec<_>>(), vec!["once"]);
    assert_eq!(hits.get(), 1);
    assert!(!p.has_event(handle));
    assert_eq!(p.event_count(), 0);

    ticks(&mut p, 4);
    assert_eq!(hits.get(), 1);
}

/// it should not fire an event removed between ticks
#[test]
fn remove_event_between_ticks() {
    let a = looping(0, "a", 3);
    let hits = counter();
    let mut p = Player::default();
    let h = Rc::clone(&hits);
    let handle = p.add_event(a.id, 1, "gone", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });
    p.play(a).unwrap();
    p.remove_event(handle);
    // Unknown handles are ignored.
    p.remove_event(handle);
    ticks(&mut p, 3);
    assert_eq!(hits.get(), 0);
}

/// it should keep running other callbacks when one fails
#[test]
fn failing_callback_is_isolated() {
    let a = looping(0, "a", 2);
    let hits = counter();
    let mut p = Player::default();
    p.add_event(a.id, 1, "boom", |_ctx| Err(anyhow::anyhow!("sprite missing")));
    let h = Rc::clone(&hits);
    p.add_event(a.id, 1, "ok", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });
    p.play(a).unwrap();

    let out = p.tick(STEP);
    assert!(out.events.iter().any(|e| matches!(
        e,
        PlayerEvent::CallbackFailed { tag, message, .. }
            if tag == "boom" && message.contains("sprite missing")
    )));
    assert_eq!(out.fired_tags().collect::<Vec<_>>(), vec!["ok"]);
    assert_eq!(hits.get(), 1);
    assert!(p.is_playing());
}

/// it should apply a play request made from inside a callback
#[test]
fn callback_switches_clip() {
    let a = looping(0, "a", 3);
    let b = looping(1, "b", 3);
    let b_started = counter();
    let mut p = Player::default();

    let next = Arc::clone(&b);
    p.add_event(a.id, 1, "switch", move |ctx| {
        assert_eq!(ctx.tag(), "switch");
        assert_eq!(ctx.frame(), 1);
        ctx.play(Arc::clone(&next));
        Ok(())
    });
    let h = Rc::clone(&b_started);
    p.add_event(b.id, 0, "b-start", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });
    p.play(a).unwrap();

    let out = p.tick(STEP);
    assert_eq!(out.frame, Some(FrameHandle::from("b0")));
    assert_eq!(p.current_clip_id(), Some(b.id));
    assert_eq!(b_started.get(), 1);
}

/// it should register events added from inside a callback
#[test]
fn callback_adds_event() {
    let a = looping(0, "a", 4);
    let hits = counter();
    let mut p = Player::default();
    let mut added = false;
    let h = Rc::clone(&hits);
    p.add_event(a.id, 1, "arm", move |ctx| {
        if !added {
            added = true;
            let h = Rc::clone(&h);
            let clip = ctx.clip();
            ctx.add_event(clip, 2, "armed", move |_ctx| {
                h.set(h.get() + 1);
                Ok(())
            });
        }
        Ok(())
    });
    p.play(a).unwrap();
    assert_eq!(p.event_count(), 1);

    ticks(&mut p, 1);
    assert_eq!(p.event_count(), 2);
    ticks(&mut p, 1);
    assert_eq!(hits.get(), 1);
}

/// it should bound callbacks that keep restarting their own clip
#[test]
fn restart_loop_is_bounded() {
    let a = looping(0, "a", 2);
    let hits = counter();
    let mut p = Player::new(Config::default());
    let depth = p.config().max_dispatch_depth;
    let again = Arc::clone(&a);
    let h = Rc::clone(&hits);
    p.add_event(a.id, 0, "again", move |ctx| {
        h.set(h.get() + 1);
        ctx.play_with(Arc::clone(&again), true);
        Ok(())
    });

    p.play(a).unwrap();
    assert_eq!(hits.get(), depth);
    assert_eq!(p.current_frame(), 0);
    assert!(p.is_playing());
}

/// it should apply queue requests from callbacks, in order
#[test]
fn callbacks_queue_and_clear() {
    let a = Arc::new(Clip::new(ClipId(0), "a", frames("a", 4), RATE).with_looping(false));
    let q = looping(1, "q", 2);
    let r = looping(2, "r", 2);
    let mut p = Player::default();

    let (q2, r2) = (Arc::clone(&q), Arc::clone(&r));
    p.add_event(a.id, 1, "enqueue", move |ctx| {
        ctx.queue_animation(Arc::clone(&q2));
        ctx.queue_animation(Arc::clone(&r2));
        Ok(())
    });
    p.add_event(a.id, 2, "flush", |ctx| {
        ctx.clear_queue();
        Ok(())
    });
    p.play(Arc::clone(&a)).unwrap();

    p.tick(STEP);
    assert_eq!(
        p.queued().map(|c| c.id).collect::<Vec<_>>(),
        vec![q.id, r.id]
    );
    p.tick(STEP);
    assert_eq!(p.queue_len(), 0);

    ticks(&mut p, 2); // 3, then the end boundary
    assert!(!p.is_playing());
    assert_eq!(p.current_clip_id(), Some(a.id));
    assert_eq!(p.current_frame(), 3);
}

/// it should scrub with a range value set from a callback
#[test]
fn callback_sets_range_value() {
    let aim = Arc::new(
        Clip::new(ClipId(0), "aim", frames("s", 5), 0.0).with_range(0.0, 1.0, false),
    );
    assert_eq!(aim.style, PlaybackStyle::Range);
    let mut p = Player::default();
    p.add_event(aim.id, 0, "aim-at", |ctx| {
        ctx.set_range_value(0.7);
        Ok(())
    });
    p.play(aim).unwrap();
    assert_eq!(p.range_value(), 0.7);

    let out = p.tick(STEP);
    assert_eq!(out.frame, Some(FrameHandle::from("s3")));
    assert_eq!(p.range_value(), 0.7);
}

/// it should let one callback unregister another
#[test]
fn callback_removes_other_event() {
    let a = looping(0, "a", 4);
    let hits = counter();
    let mut p = Player::default();
    let h = Rc::clone(&hits);
    let victim = p.add_event(a.id, 2, "victim", move |_ctx| {
        h.set(h.get() + 1);
        Ok(())
    });
    let killer = p.add_event(a.id, 1, "killer", move |ctx| {
        ctx.remove_event(victim);
        Ok(())
    });
    p.play(a).unwrap();

    p.tick(STEP);
    assert!(!p.has_event(victim));
    assert!(p.has_event(killer));
    assert_eq!(p.event_count(), 1);

    ticks(&mut p, 4);
    assert_eq!(hits.get(), 0);
}

/// it should keep dispatching after a callback panic is caught by the host
#[test]
fn dispatch_recovers_after_callback_panic() {
    let a = looping(0, "a", 2);
    let hits = counter();
    let mut p = Player::new(Config {
        max_dispatch_depth: 1,
        ..Config::default()
    });
    let mut first = true;
    let h = Rc::clone(&hits);
    p.add_event(a.id, 1, "flaky", move |_ctx| {
        if first {
            first = false;
            panic!("host bug");
        }
        h.set(h.get() + 1);
        Ok(())
    });
    p.play(a).unwrap();

    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        p.tick(STEP);
    }));
    assert!(caught.is_err());

    ticks(&mut p, 2); // 0, 1
    assert_eq!(hits.get(), 1);
}
