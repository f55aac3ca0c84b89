//! Playback against a host simulation
//!
//! [`PlaybackDriver`] steps one frame per call, [`SaveStateManager`] gates
//! save-state restores by checksum and [`HeadlessRunner`] provides the
//! surrounding run/pause loop when there is no interactive host.

mod driver;
mod headless;
mod report;
mod savestate;
mod surface;

pub use driver::PlaybackDriver;
pub use headless::{HeadlessConfig, HeadlessRunner};
pub use report::{PlaybackReport, StopReason};
pub use savestate::{LoadStateError, SaveStateBackend, SaveStateManager};
pub use surface::InputSurface;
