//! tasrun core - deterministic playback of TAS scripts
//!
//! This crate turns a script file (plus everything it `Read`s) into a
//! frame-indexed [`Timeline`] and steps it against a host simulation.
//!
//! # Architecture
//!
//! - [`ScriptParser`] - line-by-line parser, file inclusion and `Repeat` unrolling
//! - [`CommandRegistry`] - directive table with timing and legality metadata
//! - [`Timeline`] - parsed inputs, commands and fast-forward markers plus cursors
//! - [`PlaybackDriver`] - advances the timeline one simulation frame at a time
//! - [`SaveStateManager`] - decides when a save-state may be loaded, via checksums
//! - [`HeadlessRunner`] - the surrounding run/pause loop for tests and the CLI

pub mod checksum;
pub mod command;
pub mod config;
pub mod context;
pub mod input;
#[cfg(test)]
mod integration;
pub mod runtime;
pub mod script;
#[cfg(test)]
pub mod test_utils;
pub mod timeline;

pub use checksum::compute_checksum;
pub use command::{
    Command, CommandDescriptor, CommandError, CommandHandler, CommandRegistry, ExecuteTiming,
    HostCommand, HostCommandKind, MetadataKind,
};
pub use config::{ConfigError, PlaybackConfig};
pub use context::PlaybackContext;
pub use input::{InputFrame, InputState, SourceLocation};
pub use runtime::{
    HeadlessConfig, HeadlessRunner, InputSurface, LoadStateError, PlaybackDriver, PlaybackReport,
    SaveStateBackend, SaveStateManager, StopReason,
};
pub use script::{ScriptError, ScriptParser};
pub use timeline::{Comment, FastForwardMarker, RefreshOutcome, Timeline};

// Re-export the line grammar for convenience
pub use tasrun_shared::{ActionLine, Actions, MAX_FRAMES};
