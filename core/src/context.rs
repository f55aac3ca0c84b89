//! Run-mode state shared by the parser, command handlers and the driver.

use std::collections::BTreeSet;

use crate::command::{HostCommand, MetadataRequest};

/// Mutable run state passed into every command handler.
///
/// One context belongs to one playback session, so several timelines can
/// be driven side by side without sharing flags.
#[derive(Debug, Clone, Default)]
pub struct PlaybackContext {
    /// Restricted mode: runtime commands not legal in full-game runs are skipped.
    pub enforce_legal: bool,
    /// Set by `Unsafe`, cleared by `Safe`.
    pub allow_unsafe: bool,
    /// True while a parse-time handler runs.
    pub parsing: bool,
    /// Observed at the top of the next tick.
    pub disabled: bool,
    /// Skips file-change checks while the host runs uncapped.
    pub uncapped_fast_forward: bool,

    pressed_keys: BTreeSet<String>,
    host_commands: Vec<HostCommand>,
    metadata_requests: Vec<MetadataRequest>,
}

impl PlaybackContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset flags that a parse establishes from scratch.
    pub fn begin_parse(&mut self) {
        self.enforce_legal = false;
        self.allow_unsafe = false;
        self.parsing = false;
    }

    /// Take over the flags produced by a successful parse into `scratch`.
    pub fn adopt_parse_state(&mut self, scratch: &PlaybackContext) {
        self.enforce_legal = scratch.enforce_legal;
        self.allow_unsafe = scratch.allow_unsafe;
    }

    pub fn press_key(&mut self, key: impl Into<String>) {
        self.pressed_keys.insert(key.into());
    }

    pub fn pressed_keys(&self) -> &BTreeSet<String> {
        &self.pressed_keys
    }

    pub fn release_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn queue_host_command(&mut self, command: HostCommand) {
        self.host_commands.push(command);
    }

    pub fn take_host_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.host_commands)
    }

    pub fn request_metadata(&mut self, request: MetadataRequest) {
        self.metadata_requests.push(request);
    }

    pub fn take_metadata_requests(&mut self) -> Vec<MetadataRequest> {
        std::mem::take(&mut self.metadata_requests)
    }

    /// Clear per-run state. Parse flags survive; they belong to the script.
    pub fn reset_run_state(&mut self) {
        self.disabled = false;
        self.uncapped_fast_forward = false;
        self.pressed_keys.clear();
        self.host_commands.clear();
        self.metadata_requests.clear();
    }
}
