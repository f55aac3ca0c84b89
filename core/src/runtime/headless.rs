//! Headless playback
//!
//! Provides the run/pause loop around [`PlaybackDriver`] without a real
//! host: each real-time slice calls the driver `speed` times, pauses at
//! breakpoints and takes save-states where the script asks for them.
//! Ideal for CI/testing.

use anyhow::{Context, Result};
use hashbrown::HashSet;
use std::path::Path;
use std::time::Instant;

use crate::config::PlaybackConfig;
use crate::input::InputState;
use crate::timeline::RefreshOutcome;

use super::report::{PlaybackReport, StopReason};
use super::{InputSurface, LoadStateError, PlaybackDriver, SaveStateBackend, SaveStateManager};

/// Headless runner configuration
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Give up after this many driver calls
    pub max_ticks: u64,
    /// Return at breakpoints instead of playing through them
    pub pause_at_breakpoints: bool,
    /// Script file path (for reporting)
    pub script_path: Option<String>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            max_ticks: 10_000_000,
            pause_at_breakpoints: true,
            script_path: None,
        }
    }
}

struct ManualSurface;

impl InputSurface for ManualSurface {
    fn apply_input(&mut self, _state: &InputState) {}
}

#[derive(Default)]
struct ManualBackend {
    slots: HashSet<u32>,
}

impl SaveStateBackend for ManualBackend {
    fn save(&mut self, slot: u32) -> bool {
        self.slots.insert(slot);
        true
    }

    fn load(&mut self, slot: u32) -> bool {
        self.slots.contains(&slot)
    }

    fn clear(&mut self, slot: u32) {
        self.slots.remove(&slot);
    }
}

/// Headless playback runner
///
/// Counters accumulate across calls, so a run paused at a breakpoint can be
/// resumed by executing again.
pub struct HeadlessRunner {
    driver: PlaybackDriver,
    savestates: SaveStateManager,
    config: HeadlessConfig,
    ticks: u64,
    slices: u64,
    saves: u64,
    breakpoints: Vec<usize>,
    /// Breakpoint frame already acted on
    handled_breakpoint: Option<usize>,
    start_time: Option<Instant>,
}

impl HeadlessRunner {
    /// Create a new headless runner
    pub fn new(driver: PlaybackDriver, config: HeadlessConfig) -> Self {
        let savestates = SaveStateManager::from_config(driver.config());
        Self {
            driver,
            savestates,
            config,
            ticks: 0,
            slices: 0,
            saves: 0,
            breakpoints: Vec::new(),
            handled_breakpoint: None,
            start_time: None,
        }
    }

    /// Create from a script file, parsing it up front
    pub fn from_file(
        script_path: &Path,
        playback: PlaybackConfig,
        config: HeadlessConfig,
    ) -> Result<Self> {
        let mut driver = PlaybackDriver::new(script_path, playback);
        if let RefreshOutcome::Failed(error) = driver.refresh(&mut ManualSurface) {
            return Err(error)
                .with_context(|| format!("Failed to parse script: {}", script_path.display()));
        }

        let mut runner_config = config;
        runner_config.script_path = Some(script_path.display().to_string());

        Ok(Self::new(driver, runner_config))
    }

    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut PlaybackDriver {
        &mut self.driver
    }

    pub fn savestates(&self) -> &SaveStateManager {
        &self.savestates
    }

    /// Run without a host
    pub fn execute(&mut self) -> Result<PlaybackReport> {
        let mut backend = ManualBackend::default();
        self.execute_with_backend(&mut ManualSurface, &mut backend)
    }

    /// Run against a concrete host until the script ends, a breakpoint
    /// pauses, the tick limit is reached or playback is disabled.
    pub fn execute_with_backend<S: InputSurface, B: SaveStateBackend>(
        &mut self,
        surface: &mut S,
        backend: &mut B,
    ) -> Result<PlaybackReport> {
        let start = *self.start_time.get_or_insert_with(Instant::now);

        let never_parsed = self.driver.timeline().used_files().next().is_none();
        if let RefreshOutcome::Failed(error) = self.driver.refresh(surface)
            && never_parsed
        {
            return Err(error).with_context(|| {
                format!(
                    "Failed to parse script: {}",
                    self.driver.timeline().root().display()
                )
            });
        }

        let stop_reason = loop {
            if self.driver.context().disabled {
                break StopReason::Disabled;
            }
            if self.ticks >= self.config.max_ticks {
                break StopReason::MaxTicks;
            }
            if let Some(frame) = self.handle_breakpoint(backend) {
                break StopReason::Breakpoint { frame };
            }

            if !self.play_slice(surface) {
                break if self.driver.context().disabled {
                    StopReason::Disabled
                } else {
                    StopReason::EndOfScript
                };
            }
        };

        log::debug!(
            "Headless run stopped after {} ticks: {:?}",
            self.ticks,
            stop_reason
        );
        Ok(self.report(stop_reason, start))
    }

    /// Restore the last save-state and continue from its frame.
    pub fn load_state<S: InputSurface, B: SaveStateBackend>(
        &mut self,
        surface: &mut S,
        backend: &mut B,
    ) -> Result<usize, LoadStateError> {
        self.driver.refresh(surface);
        let frame = self.savestates.load(self.driver.timeline_mut(), backend)?;
        // Do not pause again on the breakpoint that produced the save
        self.handled_breakpoint = Some(frame);
        Ok(frame)
    }

    /// One real-time slice: up to `speed` driver calls.
    ///
    /// Returns false once the driver has nothing left to play.
    fn play_slice<S: InputSurface>(&mut self, surface: &mut S) -> bool {
        let speed = self.driver.fast_forward_speed();
        self.slices += 1;

        for _ in 0..speed {
            if self.ticks >= self.config.max_ticks {
                break;
            }
            self.ticks += 1;
            if !self.driver.advance_frame(surface) {
                return false;
            }
            if self.driver.is_at_breakpoint() {
                break;
            }
        }
        true
    }

    /// Act on a breakpoint at the current frame, once.
    ///
    /// Returns the frame when the run should pause there.
    fn handle_breakpoint<B: SaveStateBackend>(&mut self, backend: &mut B) -> Option<usize> {
        let frame = self.driver.timeline().current_frame();
        if self.handled_breakpoint == Some(frame) || !self.driver.is_at_breakpoint() {
            return None;
        }
        self.handled_breakpoint = Some(frame);
        self.breakpoints.push(frame);

        if self.driver.timeline().save_state_breakpoint().is_some()
            && self.savestates.save(self.driver.timeline(), backend)
        {
            self.saves += 1;
        }

        let timeline = self.driver.timeline_mut();
        if timeline
            .label_target()
            .is_some_and(|target| target.frame == frame)
        {
            timeline.clear_label_target();
        }

        self.config.pause_at_breakpoints.then_some(frame)
    }

    fn report(&self, stop_reason: StopReason, start: Instant) -> PlaybackReport {
        let timeline = self.driver.timeline();
        let script = self
            .config
            .script_path
            .clone()
            .unwrap_or_else(|| timeline.root().display().to_string());

        PlaybackReport {
            version: "1.0".to_string(),
            script: Some(script),
            executed_at: Some(chrono::Utc::now().to_rfc3339()),
            duration_ms: Some(start.elapsed().as_millis() as u64),
            frames_played: self.driver.frames_played(),
            total_frames: timeline.len() as u64,
            ticks: self.ticks,
            slices: self.slices,
            breakpoints: self.breakpoints.clone(),
            saves: self.saves,
            host_commands: self.driver.host_commands(),
            checksum: timeline.full_checksum(),
            stop_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptDir;

    fn runner(dir: &ScriptDir, content: &str, config: HeadlessConfig) -> HeadlessRunner {
        let root = dir.write("main.tas", content);
        HeadlessRunner::from_file(&root, PlaybackConfig::default(), config).unwrap()
    }

    #[test]
    fn test_from_missing_file() {
        let dir = ScriptDir::new();
        let result = HeadlessRunner::from_file(
            &dir.path().join("missing.tas"),
            PlaybackConfig::default(),
            HeadlessConfig::default(),
        );
        let error = result.err().unwrap();
        assert!(error.to_string().contains("Failed to parse script"));
    }

    #[test]
    fn test_headless_execution() {
        let dir = ScriptDir::new();
        let mut runner = runner(&dir, "10,R\n5,J\n", HeadlessConfig::default());

        let report = runner.execute().expect("Execution failed");
        assert_eq!(report.stop_reason, StopReason::EndOfScript);
        assert_eq!(report.frames_played, 15);
        assert_eq!(report.total_frames, 15);
        // One extra call discovers the end
        assert_eq!(report.ticks, 16);
        assert!(report.script.as_deref().unwrap().ends_with("main.tas"));
        assert!(report.duration_ms.is_some());
        assert!(report.executed_at.is_some());
        assert_eq!(report.checksum, runner.driver().timeline().full_checksum());
    }

    #[test]
    fn test_pause_and_resume() {
        let dir = ScriptDir::new();
        let mut runner = runner(&dir, "10,R\n***\n5,J\n", HeadlessConfig::default());

        let report = runner.execute().unwrap();
        assert_eq!(report.stop_reason, StopReason::Breakpoint { frame: 10 });
        assert_eq!(report.frames_played, 10);
        // Fast-forwarded in a single slice
        assert_eq!(report.slices, 1);

        let report = runner.execute().unwrap();
        assert_eq!(report.stop_reason, StopReason::EndOfScript);
        assert_eq!(report.frames_played, 15);
        assert_eq!(report.breakpoints, vec![10]);
    }

    #[test]
    fn test_play_through_breakpoints() {
        let dir = ScriptDir::new();
        let config = HeadlessConfig {
            pause_at_breakpoints: false,
            ..Default::default()
        };
        let mut runner = runner(&dir, "4,R\n***!\n4,R\n***S\n4,J\n", config);

        let report = runner.execute().unwrap();
        assert_eq!(report.stop_reason, StopReason::EndOfScript);
        assert_eq!(report.breakpoints, vec![4, 8]);
        assert_eq!(report.saves, 1);
        assert_eq!(runner.savestates().saved_frame(), Some(8));
    }

    #[test]
    fn test_max_ticks() {
        let dir = ScriptDir::new();
        let config = HeadlessConfig {
            max_ticks: 7,
            ..Default::default()
        };
        let mut runner = runner(&dir, "100,R\n", config);

        let report = runner.execute().unwrap();
        assert_eq!(report.stop_reason, StopReason::MaxTicks);
        assert_eq!(report.ticks, 7);
        assert_eq!(report.frames_played, 7);
    }

    #[test]
    fn test_disabled() {
        let dir = ScriptDir::new();
        let mut runner = runner(&dir, "100,R\n", HeadlessConfig::default());
        runner.driver_mut().disable();

        let report = runner.execute().unwrap();
        assert_eq!(report.stop_reason, StopReason::Disabled);
        assert_eq!(report.frames_played, 0);
    }
}
