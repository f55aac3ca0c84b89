//! Save-state gating
//!
//! The host owns the actual snapshot of simulation memory. This module
//! only decides whether a snapshot still matches the script: a load is
//! allowed when nothing before the saved frame changed since the save.

use crate::config::PlaybackConfig;
use crate::timeline::Timeline;

/// Host snapshot storage, addressed by slot.
pub trait SaveStateBackend {
    /// Snapshot the host into `slot`. Returns false when the host refused.
    fn save(&mut self, slot: u32) -> bool;
    /// Restore `slot`. Returns false when the slot is empty or unusable.
    fn load(&mut self, slot: u32) -> bool;
    fn clear(&mut self, slot: u32);
}

/// Why a save-state was not restored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadStateError {
    #[error("no save-state recorded")]
    NoSaveState,

    #[error("saved frame {frame} is past the end of the script ({len} frames)")]
    FrameOutOfRange { frame: usize, len: usize },

    #[error("script changed before frame {frame} since the save-state was taken")]
    ChecksumMismatch { frame: usize },

    #[error("save-state breakpoint at frame {frame} was removed")]
    BreakpointRemoved { frame: usize },

    #[error("host failed to restore slot {slot}")]
    BackendFailed { slot: u32 },
}

/// Progress captured alongside a host snapshot.
#[derive(Debug, Clone)]
struct SavedProgress {
    timeline: Timeline,
    frame: usize,
    checksum: String,
    /// Taken at a `***S` breakpoint rather than on request
    at_save_marker: bool,
}

#[derive(Debug, Clone)]
pub struct SaveStateManager {
    slot: u32,
    saved: Option<SavedProgress>,
}

impl SaveStateManager {
    pub fn new(slot: u32) -> Self {
        Self { slot, saved: None }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.savestate.slot)
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn is_saved(&self) -> bool {
        self.saved.is_some()
    }

    /// Frame the current save-state was taken at.
    pub fn saved_frame(&self) -> Option<usize> {
        self.saved.as_ref().map(|saved| saved.frame)
    }

    /// Snapshot the host at the timeline's current frame.
    pub fn save(&mut self, timeline: &Timeline, backend: &mut impl SaveStateBackend) -> bool {
        if !backend.save(self.slot) {
            log::warn!("Host refused to save slot {}", self.slot);
            return false;
        }

        let frame = timeline.current_frame();
        self.saved = Some(SavedProgress {
            timeline: timeline.clone(),
            frame,
            checksum: timeline.checksum(frame),
            at_save_marker: timeline.save_state_marker_at(frame),
        });
        log::debug!("Saved state at frame {} in slot {}", frame, self.slot);
        true
    }

    /// Restore the host and move `timeline` back to the saved frame.
    ///
    /// A snapshot that no longer matches the script is discarded.
    pub fn load(
        &mut self,
        timeline: &mut Timeline,
        backend: &mut impl SaveStateBackend,
    ) -> Result<usize, LoadStateError> {
        let saved = self.saved.as_ref().ok_or(LoadStateError::NoSaveState)?;
        let frame = saved.frame;

        if frame > timeline.len() {
            return Err(LoadStateError::FrameOutOfRange {
                frame,
                len: timeline.len(),
            });
        }
        if timeline.checksum(frame) != saved.checksum {
            self.clear(backend);
            return Err(LoadStateError::ChecksumMismatch { frame });
        }
        if saved.at_save_marker && !timeline.save_state_marker_at(frame) {
            self.clear(backend);
            return Err(LoadStateError::BreakpointRemoved { frame });
        }
        if !backend.load(self.slot) {
            return Err(LoadStateError::BackendFailed { slot: self.slot });
        }

        timeline.copy_progress_from(&saved.timeline);
        log::debug!("Loaded state at frame {} from slot {}", frame, self.slot);
        Ok(frame)
    }

    pub fn clear(&mut self, backend: &mut impl SaveStateBackend) {
        backend.clear(self.slot);
        self.saved = None;
    }
}
