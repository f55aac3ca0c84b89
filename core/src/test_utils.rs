//! Shared test utilities for integration and unit tests

use hashbrown::HashMap;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::command::{CommandError, HostCommand, MetadataKind};
use crate::input::InputState;
use crate::runtime::{InputSurface, SaveStateBackend};
use crate::script::ScriptError;

// ============================================================================
// Script files
// ============================================================================

/// Temporary directory holding test scripts.
pub struct ScriptDir {
    dir: tempfile::TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create script dir");
        }
        std::fs::write(&path, content).expect("write script");
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("read script")
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Host doubles
// ============================================================================

/// Input surface that records everything the driver sends.
#[derive(Default)]
pub struct RecordingSurface {
    pub inputs: Vec<InputState>,
    pub host_commands: Vec<HostCommand>,
    /// Values returned by [`InputSurface::metadata`]
    pub metadata: HashMap<MetadataKind, String>,
    /// Remaining ticks reported as loading
    pub loading_ticks: Cell<u32>,
    /// Host commands are rejected when set
    pub reject_host_commands: bool,
    pub reload_failures: usize,
}

impl InputSurface for RecordingSurface {
    fn apply_input(&mut self, state: &InputState) {
        self.inputs.push(state.clone());
    }

    fn is_loading(&self) -> bool {
        let remaining = self.loading_ticks.get();
        if remaining == 0 {
            return false;
        }
        self.loading_ticks.set(remaining - 1);
        true
    }

    fn execute_host_command(&mut self, command: &HostCommand) -> Result<(), CommandError> {
        if self.reject_host_commands {
            return Err(CommandError::Host(command.to_string()));
        }
        self.host_commands.push(command.clone());
        Ok(())
    }

    fn metadata(&mut self, kind: MetadataKind) -> Option<String> {
        self.metadata.get(&kind).cloned()
    }

    fn on_reload_failed(&mut self, _error: &ScriptError) {
        self.reload_failures += 1;
    }
}

/// Save-state backend keeping occupied slots in memory.
#[derive(Default)]
pub struct MemoryBackend {
    pub slots: BTreeSet<u32>,
    pub loads: u32,
    /// Refuse every save
    pub refuse: bool,
}

impl SaveStateBackend for MemoryBackend {
    fn save(&mut self, slot: u32) -> bool {
        if self.refuse {
            return false;
        }
        self.slots.insert(slot);
        true
    }

    fn load(&mut self, slot: u32) -> bool {
        if !self.slots.contains(&slot) {
            return false;
        }
        self.loads += 1;
        true
    }

    fn clear(&mut self, slot: u32) {
        self.slots.remove(&slot);
    }
}
