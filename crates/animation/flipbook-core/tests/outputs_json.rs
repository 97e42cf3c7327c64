use std::sync::Arc;

use flipbook_core::{Clip, ClipId, Config, FrameHandle, Outputs, Player};
use serde_json::json;

fn clip() -> Arc<Clip> {
    let frames = (0..3).map(|i| FrameHandle::new(format!("walk_{i}"))).collect();
    Arc::new(Clip::new(ClipId(0), "walk", frames, 10.0))
}

#[test]
fn outputs_serialize_for_hosts() {
    let mut p = Player::default();
    p.play(clip()).unwrap();
    let out = p.tick(0.15).clone();

    let v = serde_json::to_value(&out).expect("serialize outputs");
    assert_eq!(v["frame"], json!("walk_1"));
    assert_eq!(v["frame_index"], json!(1));
    assert_eq!(v["events"][0], json!({ "ClipStarted": { "clip": 0 } }));
    assert_eq!(
        v["events"][1],
        json!({ "FrameEntered": { "clip": 0, "frame": 0 } })
    );
    assert_eq!(
        v["events"][2],
        json!({ "FrameEntered": { "clip": 0, "frame": 1 } })
    );

    let back: Outputs = serde_json::from_value(v).expect("deserialize outputs");
    assert_eq!(back, out);
}

#[test]
fn clips_and_config_load_from_json() {
    let clip: Clip = serde_json::from_value(json!({
        "id": 4,
        "name": "aim",
        "frames": ["aim_0", "aim_1", "aim_2"],
        "frameRate": 0.0,
        "style": "Range",
        "range": { "start": -1.0, "end": 1.0, "invert": true }
    }))
    .expect("clip json");
    assert!(clip.looping);
    assert!(clip.transitions.is_empty());
    clip.validate().expect("range clip is valid without a frame rate");

    let cfg: Config = serde_json::from_value(json!({ "seed": 3 })).expect("config json");
    let mut p = Player::new(cfg);
    p.play(Arc::new(clip)).unwrap();
    p.set_range_value(-1.0);
    assert_eq!(p.tick(0.0).frame_index, 2);
}
