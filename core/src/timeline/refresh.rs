//! Change detection and atomic re-parsing.

use std::path::Path;
use std::time::SystemTime;

use super::Timeline;
use crate::command::{CommandRegistry, update_record_count};
use crate::config::PlaybackConfig;
use crate::context::PlaybackContext;
use crate::script::{ScriptError, ScriptParser};

/// Modification stamp of a used file. Missing files stamp as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileStamp {
    modified: Option<SystemTime>,
    len: Option<u64>,
}

impl FileStamp {
    pub(crate) fn read(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(metadata) => Self {
                modified: metadata.modified().ok(),
                len: Some(metadata.len()),
            },
            Err(_) => Self {
                modified: None,
                len: None,
            },
        }
    }
}

/// Result of [`Timeline::refresh_if_stale`].
#[derive(Debug)]
pub enum RefreshOutcome {
    /// No used file changed
    UpToDate,
    Reloaded {
        frames: usize,
        /// Whether the full-timeline checksum differs from the previous parse
        checksum_changed: bool,
        /// `RecordCount` lines rewritten as a consequence
        records_updated: usize,
    },
    /// Every attempt failed; the previous timeline stays in place
    Failed(ScriptError),
}

impl Timeline {
    /// Whether any used file changed since it was parsed, or nothing was parsed yet.
    pub fn is_stale(&self) -> bool {
        self.needs_reload
            || self.used_files.is_empty()
            || self
                .used_files
                .iter()
                .any(|(path, stamp)| FileStamp::read(path) != *stamp)
    }

    /// Force the next refresh to re-parse.
    pub fn invalidate(&mut self) {
        self.needs_reload = true;
    }

    pub(crate) fn track_file(&mut self, path: &Path) {
        if !self.used_files.contains_key(path) {
            self.used_files.insert(path.to_path_buf(), FileStamp::read(path));
        }
    }

    /// Accept the current on-disk state of `path`, e.g. after rewriting metadata.
    pub(crate) fn restamp_file(&mut self, path: &Path) {
        if let Some(stamp) = self.used_files.get_mut(path) {
            *stamp = FileStamp::read(path);
        }
    }

    pub(crate) fn mark_parsed(&mut self) {
        self.needs_reload = false;
    }

    /// Re-parse from the root script if any used file changed.
    pub fn refresh_if_stale(
        &mut self,
        registry: &CommandRegistry,
        ctx: &mut PlaybackContext,
        config: &PlaybackConfig,
    ) -> RefreshOutcome {
        if !self.is_stale() {
            return RefreshOutcome::UpToDate;
        }
        self.reload(registry, ctx, config)
    }

    /// Re-parse unconditionally.
    ///
    /// The new timeline is built on the side and only swapped in once the
    /// parse succeeded, so a failing parse never leaves partial state. Reads
    /// that race with an external writer are retried with a short delay.
    pub fn reload(
        &mut self,
        registry: &CommandRegistry,
        ctx: &mut PlaybackContext,
        config: &PlaybackConfig,
    ) -> RefreshOutcome {
        log::debug!("Refreshing inputs from {}", self.root.display());

        let first_run = self.used_files.is_empty();
        let last_checksum = (!first_run).then(|| self.full_checksum());
        let attempts = config.reload_attempts();

        let mut attempt = 1;
        loop {
            let mut scratch = ctx.clone();
            match ScriptParser::parse(&self.root, registry, &mut scratch, config) {
                Ok(mut fresh) => {
                    ctx.adopt_parse_state(&scratch);

                    fresh.current_frame = self.current_frame.min(fresh.len());
                    fresh.frame_in_input = self.frame_in_input;
                    fresh.next_label = self.next_label.take();

                    let checksum_changed = last_checksum
                        .as_ref()
                        .is_some_and(|last| *last != fresh.full_checksum());
                    *self = fresh;

                    let records_updated = if checksum_changed {
                        update_record_count(self).unwrap_or_else(|e| {
                            log::warn!("Failed to update RecordCount: {}", e);
                            0
                        })
                    } else {
                        0
                    };

                    return RefreshOutcome::Reloaded {
                        frames: self.len(),
                        checksum_changed,
                        records_updated,
                    };
                }
                Err(error) => {
                    let retryable = !matches!(error, ScriptError::MissingRoot(_));
                    if !retryable || attempt >= attempts {
                        log::error!(
                            "Failed to parse {} after {} attempt(s): {}",
                            self.root.display(),
                            attempt,
                            error
                        );
                        return RefreshOutcome::Failed(error);
                    }
                    log::warn!(
                        "Failed to parse {} (attempt {}/{}): {}",
                        self.root.display(),
                        attempt,
                        attempts,
                        error
                    );
                    std::thread::sleep(config.reload_delay());
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptDir;

    #[test]
    fn test_initial_refresh_parses() {
        let dir = ScriptDir::new();
        let root = dir.write("main.tas", "10,R\n5,J\n");
        let mut timeline = Timeline::new(&root);
        let mut ctx = PlaybackContext::new();
        let config = PlaybackConfig::default();

        assert!(timeline.is_stale());
        let outcome = timeline.refresh_if_stale(&CommandRegistry::builtin(), &mut ctx, &config);
        assert!(matches!(
            outcome,
            RefreshOutcome::Reloaded {
                frames: 15,
                checksum_changed: false,
                ..
            }
        ));
        assert!(!timeline.is_stale());

        let outcome = timeline.refresh_if_stale(&CommandRegistry::builtin(), &mut ctx, &config);
        assert!(matches!(outcome, RefreshOutcome::UpToDate));
    }

    #[test]
    fn test_edit_triggers_reparse_and_clamps_cursor() {
        let dir = ScriptDir::new();
        let root = dir.write("main.tas", "10,R\n");
        let registry = CommandRegistry::builtin();
        let mut ctx = PlaybackContext::new();
        let config = PlaybackConfig::default();
        let mut timeline = Timeline::new(&root);
        timeline.refresh_if_stale(&registry, &mut ctx, &config);
        for _ in 0..8 {
            timeline.advance_cursor();
        }

        dir.write("main.tas", "3,L\n");
        assert!(timeline.is_stale());
        let outcome = timeline.refresh_if_stale(&registry, &mut ctx, &config);
        assert!(matches!(
            outcome,
            RefreshOutcome::Reloaded {
                frames: 3,
                checksum_changed: true,
                ..
            }
        ));
        assert_eq!(timeline.current_frame(), 3);
    }

    #[test]
    fn test_missing_root_keeps_last_good_timeline() {
        let dir = ScriptDir::new();
        let root = dir.write("main.tas", "4,R\n");
        let registry = CommandRegistry::builtin();
        let mut ctx = PlaybackContext::new();
        let config = PlaybackConfig::default();
        let mut timeline = Timeline::new(&root);
        timeline.refresh_if_stale(&registry, &mut ctx, &config);

        std::fs::remove_file(&root).unwrap();
        let outcome = timeline.refresh_if_stale(&registry, &mut ctx, &config);
        assert!(matches!(
            outcome,
            RefreshOutcome::Failed(ScriptError::MissingRoot(_))
        ));
        assert_eq!(timeline.len(), 4);
    }

    #[test]
    fn test_record_count_increments_on_change() {
        let dir = ScriptDir::new();
        let root = dir.write("main.tas", "RecordCount: 4\n10,R\n");
        let registry = CommandRegistry::builtin();
        let mut ctx = PlaybackContext::new();
        let config = PlaybackConfig::default();
        let mut timeline = Timeline::new(&root);
        timeline.refresh_if_stale(&registry, &mut ctx, &config);

        dir.write("main.tas", "RecordCount: 4\n120,R\n");
        let outcome = timeline.refresh_if_stale(&registry, &mut ctx, &config);
        assert!(matches!(
            outcome,
            RefreshOutcome::Reloaded {
                records_updated: 1,
                ..
            }
        ));
        assert_eq!(dir.read("main.tas"), "RecordCount: 5\n120,R\n");

        // The rewrite itself must not count as another edit
        assert!(!timeline.is_stale());
    }
}
