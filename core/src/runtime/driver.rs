//! Per-tick playback
//!
//! [`PlaybackDriver::advance_frame`] is called once per host simulation
//! step. It owns no run/pause state: the surrounding loop reads
//! [`PlaybackDriver::fast_forward_speed`] and
//! [`PlaybackDriver::is_at_breakpoint`] to decide how often to call it.

use std::path::PathBuf;

use crate::command::{
    CommandRegistry, ExecuteTiming, MetadataKind, update_metadata, update_metadata_at,
};
use crate::config::PlaybackConfig;
use crate::context::PlaybackContext;
use crate::input::InputState;
use crate::timeline::{RefreshOutcome, Timeline};

use super::InputSurface;

/// Metadata written once when playback reaches the end of the script.
const END_OF_RUN_METADATA: [MetadataKind; 2] = [MetadataKind::FileTime, MetadataKind::ChapterTime];

pub struct PlaybackDriver {
    timeline: Timeline,
    registry: CommandRegistry,
    context: PlaybackContext,
    config: PlaybackConfig,
    /// End-of-run bookkeeping already done
    finished: bool,
    frames_played: u64,
    host_commands: u64,
}

impl PlaybackDriver {
    /// Driver for `root` with the built-in directives.
    ///
    /// Nothing is read until the first refresh.
    pub fn new(root: impl Into<PathBuf>, config: PlaybackConfig) -> Self {
        Self::with_registry(root, config, CommandRegistry::builtin())
    }

    pub fn with_registry(
        root: impl Into<PathBuf>,
        config: PlaybackConfig,
        registry: CommandRegistry,
    ) -> Self {
        Self {
            timeline: Timeline::new(root),
            registry,
            context: PlaybackContext::new(),
            config,
            finished: false,
            frames_played: 0,
            host_commands: 0,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable timeline, for save-state restores and label navigation.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PlaybackContext {
        &mut self.context
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Frames whose input reached the host so far.
    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    /// Host commands forwarded so far.
    pub fn host_commands(&self) -> u64 {
        self.host_commands
    }

    /// Re-parse if any script file changed on disk.
    pub fn refresh(&mut self, surface: &mut impl InputSurface) -> RefreshOutcome {
        let outcome = self
            .timeline
            .refresh_if_stale(&self.registry, &mut self.context, &self.config);
        match &outcome {
            RefreshOutcome::UpToDate => {}
            RefreshOutcome::Reloaded {
                frames,
                checksum_changed,
                records_updated,
            } => {
                log::debug!(
                    "Loaded {} frames from {} (changed: {}, records updated: {})",
                    frames,
                    self.timeline.root().display(),
                    checksum_changed,
                    records_updated
                );
                // A longer script can be played again
                if self.timeline.can_playback() {
                    self.finished = false;
                }
            }
            RefreshOutcome::Failed(error) => surface.on_reload_failed(error),
        }
        outcome
    }

    /// Play one simulation tick.
    ///
    /// Returns false when nothing was left to play or the driver is disabled.
    /// A tick skipped because the host is loading still returns true.
    pub fn advance_frame(&mut self, surface: &mut impl InputSurface) -> bool {
        if self.context.disabled {
            return false;
        }

        if !self.context.uncapped_fast_forward {
            self.refresh(surface);
        }

        if surface.is_loading() {
            return true;
        }

        let frame = self.timeline.current_frame();
        if self
            .timeline
            .current()
            .is_some_and(|input| input.frame_offset == frame)
        {
            // Press keys last until the input line changes
            self.context.release_keys();
        }

        self.run_commands();
        self.forward_host_commands(surface);
        self.resolve_metadata(surface);

        let Some(input) = self.timeline.current() else {
            self.finish(surface);
            return false;
        };

        let state = InputState::from_frame(input, self.context.pressed_keys());
        surface.apply_input(&state);
        self.timeline.advance_cursor();
        self.frames_played += 1;
        true
    }

    fn run_commands(&mut self) {
        for command in self.timeline.current_commands() {
            if !command.runs_at(ExecuteTiming::RUNTIME) {
                continue;
            }
            if self.context.enforce_legal && !command.descriptor.legal_in_full_game {
                log::debug!("Skipping \"{}\" in restricted mode", command.line_text);
                continue;
            }
            if let Err(error) = command.invoke(&mut self.context, &self.timeline) {
                log::warn!("\"{}\" at {} failed: {}", command.line_text, command.source, error);
            }
        }
    }

    fn forward_host_commands(&mut self, surface: &mut impl InputSurface) {
        for command in self.context.take_host_commands() {
            self.host_commands += 1;
            if let Err(error) = surface.execute_host_command(&command) {
                log::warn!("Host command \"{}\" failed: {}", command, error);
            }
        }
    }

    fn resolve_metadata(&mut self, surface: &mut impl InputSurface) {
        for request in self.context.take_metadata_requests() {
            let Some(value) = surface.metadata(request.kind) else {
                continue;
            };
            if let Err(error) = update_metadata_at(&mut self.timeline, &request, &value) {
                log::warn!(
                    "Failed to update {} in {}: {}",
                    request.kind.command_name(),
                    request.file.display(),
                    error
                );
            }
        }
    }

    fn finish(&mut self, surface: &mut impl InputSurface) {
        if self.finished {
            return;
        }
        self.finished = true;

        for kind in END_OF_RUN_METADATA {
            let Some(value) = surface.metadata(kind) else {
                continue;
            };
            match update_metadata(&mut self.timeline, kind, &value) {
                Ok(0) => {}
                Ok(count) => log::debug!("Updated {} {} line(s)", count, kind.command_name()),
                Err(error) => log::warn!("Failed to update {}: {}", kind.command_name(), error),
            }
        }
    }

    /// See [`Timeline::fast_forward_speed`].
    pub fn fast_forward_speed(&self) -> u32 {
        self.timeline.fast_forward_speed()
    }

    pub fn is_at_breakpoint(&self) -> bool {
        self.timeline.is_at_breakpoint()
    }

    pub fn fast_forward_to_next_label(&mut self) -> Option<usize> {
        self.timeline.fast_forward_to_next_label()
    }

    pub fn can_playback(&self) -> bool {
        self.timeline.can_playback()
    }

    /// Rewind to frame 0 and clear per-run state.
    pub fn stop(&mut self) {
        self.timeline.stop();
        self.context.reset_run_state();
        self.finished = false;
    }

    /// Stop being driven; observed at the top of the next tick.
    pub fn disable(&mut self) {
        self.context.disabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::HostCommandKind;
    use crate::test_utils::{RecordingSurface, ScriptDir};
    use std::cell::Cell;
    use tasrun_shared::Actions;

    fn driver(dir: &ScriptDir, content: &str) -> PlaybackDriver {
        let root = dir.write("main.tas", content);
        PlaybackDriver::new(root, PlaybackConfig::default())
    }

    #[test]
    fn test_plays_every_frame_then_stops() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "2,R\n1,J\n");
        let mut surface = RecordingSurface::default();

        assert!(driver.advance_frame(&mut surface));
        assert!(driver.advance_frame(&mut surface));
        assert!(driver.advance_frame(&mut surface));
        assert!(!driver.advance_frame(&mut surface));

        let actions: Vec<_> = surface.inputs.iter().map(|s| s.actions).collect();
        assert_eq!(actions, vec![Actions::RIGHT, Actions::RIGHT, Actions::JUMP]);
        assert_eq!(driver.frames_played(), 3);
        assert_eq!(driver.timeline().frame_in_input(), 1);
    }

    #[test]
    fn test_loading_host_skips_tick() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "2,R\n");
        let mut surface = RecordingSurface {
            loading_ticks: Cell::new(3),
            ..Default::default()
        };

        for _ in 0..3 {
            assert!(driver.advance_frame(&mut surface));
        }
        assert!(surface.inputs.is_empty());
        assert_eq!(driver.timeline().current_frame(), 0);

        assert!(driver.advance_frame(&mut surface));
        assert_eq!(surface.inputs.len(), 1);
    }

    #[test]
    fn test_disabled_driver_does_nothing() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "2,R\n");
        let mut surface = RecordingSurface::default();
        driver.disable();
        assert!(!driver.advance_frame(&mut surface));
        assert!(surface.inputs.is_empty());
    }

    #[test]
    fn test_host_commands_forwarded() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "Console load 1\n1\nSet, Player.X, 5\n1\n");
        let mut surface = RecordingSurface::default();
        while driver.advance_frame(&mut surface) {}

        assert_eq!(surface.host_commands.len(), 2);
        assert_eq!(surface.host_commands[0].kind, HostCommandKind::Console);
        assert_eq!(surface.host_commands[1].to_string(), "Set Player.X 5");
        assert_eq!(driver.host_commands(), 2);
    }

    #[test]
    fn test_restricted_mode_skips_illegal_commands() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "EnforceLegal\nConsole load 1\n2,R\n");
        let mut surface = RecordingSurface::default();
        while driver.advance_frame(&mut surface) {}

        assert!(driver.context().enforce_legal);
        assert!(surface.host_commands.is_empty());
        assert_eq!(surface.inputs.len(), 2);
    }

    #[test]
    fn test_pressed_keys_last_for_one_line() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "Press, a, LeftShift\n2,R\n1,J\n");
        let mut surface = RecordingSurface::default();
        while driver.advance_frame(&mut surface) {}

        assert_eq!(surface.inputs[0].pressed_keys, vec!["A", "LEFTSHIFT"]);
        assert_eq!(surface.inputs[1].pressed_keys, vec!["A", "LEFTSHIFT"]);
        assert!(surface.inputs[2].pressed_keys.is_empty());
    }

    #[test]
    fn test_feather_reaches_surface_as_stick() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "1,F,90,0.5\n");
        let mut surface = RecordingSurface::default();
        driver.advance_frame(&mut surface);

        let state = &surface.inputs[0];
        assert!(state.analog);
        assert!((state.stick.0 - 0.5).abs() < 1e-5);
        assert!(state.stick.1.abs() < 1e-5);
    }

    #[test]
    fn test_end_of_run_metadata_written_once() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "FileTime:\n2,R\n");
        let mut surface = RecordingSurface::default();
        surface
            .metadata
            .insert(MetadataKind::FileTime, "0:00.034".to_string());

        while driver.advance_frame(&mut surface) {}
        assert_eq!(dir.read("main.tas"), "FileTime: 0:00.034\n2,R\n");
        assert!(!driver.timeline().is_stale());

        surface
            .metadata
            .insert(MetadataKind::FileTime, "9:99.999".to_string());
        assert!(!driver.advance_frame(&mut surface));
        assert_eq!(dir.read("main.tas"), "FileTime: 0:00.034\n2,R\n");
    }

    #[test]
    fn test_room_name_filled_at_runtime() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "1,R\nRoomName\n1,J\n");
        let mut surface = RecordingSurface::default();
        surface
            .metadata
            .insert(MetadataKind::RoomName, "a-00".to_string());

        while driver.advance_frame(&mut surface) {}
        assert_eq!(dir.read("main.tas"), "1,R\nRoomName: a-00\n1,J\n");
    }

    #[test]
    fn test_stop_rewinds() {
        let dir = ScriptDir::new();
        let mut driver = driver(&dir, "3,R\n");
        let mut surface = RecordingSurface::default();
        while driver.advance_frame(&mut surface) {}

        driver.stop();
        assert_eq!(driver.timeline().current_frame(), 0);
        assert!(driver.advance_frame(&mut surface));
        assert_eq!(surface.inputs.len(), 4);
    }
}
