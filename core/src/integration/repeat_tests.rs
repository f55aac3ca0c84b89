//! `Repeat` unrolling seen from playback.

use crate::config::PlaybackConfig;
use crate::runtime::PlaybackDriver;
use crate::test_utils::{RecordingSurface, ScriptDir};
use tasrun_shared::Actions;

fn driver(dir: &ScriptDir, content: &str) -> PlaybackDriver {
    let root = dir.write("main.tas", content);
    let mut driver = PlaybackDriver::new(root, PlaybackConfig::default());
    driver.refresh(&mut RecordingSurface::default());
    driver
}

#[test]
fn test_repeat_produces_count_times_body() {
    let dir = ScriptDir::new();
    // Body totals F = 4 frames
    let driver = driver(&dir, "Repeat 3\n3,R\n1,J\nEndRepeat\n");
    let timeline = driver.timeline();

    assert_eq!(timeline.len(), 12);
    assert_eq!(timeline.entries().len(), 6);

    let indices: Vec<_> = (0..12)
        .map(|frame| timeline.input_at(frame).unwrap().repeat_index)
        .collect();
    assert_eq!(indices, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
    assert!(
        timeline
            .entries()
            .iter()
            .all(|input| input.repeat_count == 3)
    );
    assert_eq!(timeline.input_at(5).unwrap().repeat_label(), " 2/3");
}

#[test]
fn test_repeat_iterations_are_distinct_lines() {
    let dir = ScriptDir::new();
    let mut driver = driver(&dir, "Repeat 2\n2,R\nEndRepeat\n");
    let mut surface = RecordingSurface::default();

    let mut frame_in_input = Vec::new();
    while driver.advance_frame(&mut surface) {
        frame_in_input.push(driver.timeline().frame_in_input());
    }
    // Second iteration restarts the per-line counter
    assert_eq!(frame_in_input, vec![1, 2, 1, 2]);
}

#[test]
fn test_repeat_with_commands_and_markers() {
    let dir = ScriptDir::new();
    let mut driver = driver(
        &dir,
        "Repeat 2\nPress, A\n1,R\n***\n1,J\nEndRepeat\n1,X\n",
    );
    let timeline = driver.timeline();

    assert_eq!(timeline.len(), 5);
    let press_frames: Vec<_> = timeline
        .commands()
        .filter(|command| command.is("Press"))
        .map(|command| command.frame)
        .collect();
    assert_eq!(press_frames, vec![0, 2]);
    let markers: Vec<_> = timeline.fast_forwards().map(|marker| marker.frame).collect();
    assert_eq!(markers, vec![1, 3]);

    let mut surface = RecordingSurface::default();
    while driver.advance_frame(&mut surface) {}
    let actions: Vec<_> = surface.inputs.iter().map(|s| s.actions).collect();
    assert_eq!(
        actions,
        vec![
            Actions::RIGHT,
            Actions::JUMP,
            Actions::RIGHT,
            Actions::JUMP,
            Actions::DASH
        ]
    );
    assert_eq!(surface.inputs[0].pressed_keys, vec!["A"]);
    assert!(surface.inputs[1].pressed_keys.is_empty());
    assert_eq!(surface.inputs[2].pressed_keys, vec!["A"]);
}

#[test]
fn test_repeat_read_inside_body() {
    let dir = ScriptDir::new();
    dir.write("step.tas", "2,L\n");
    let driver = driver(&dir, "Repeat, 3\nRead, step\nEndRepeat\n");
    let timeline = driver.timeline();

    assert_eq!(timeline.len(), 6);
    let tags: Vec<_> = timeline
        .entries()
        .iter()
        .map(|input| (input.repeat_index, input.repeat_count))
        .collect();
    assert_eq!(tags, vec![(1, 3), (2, 3), (3, 3)]);
}
