//! The parsed, navigable program
//!
//! A [`Timeline`] owns every input, command, comment and fast-forward marker
//! of one root script and the scripts it includes, keyed by frame, plus the
//! playback cursors.

mod fast_forward;
mod refresh;

pub use fast_forward::{Comment, FastForwardMarker};
pub use refresh::RefreshOutcome;

use hashbrown::HashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::command::Command;
use crate::input::InputFrame;
use refresh::FileStamp;

/// Commands sharing one frame; almost always zero to two.
pub type FrameCommands = SmallVec<[Command; 2]>;

#[derive(Debug, Clone)]
pub struct Timeline {
    root: PathBuf,

    /// One entry per action line, in frame order
    entries: Vec<InputFrame>,
    /// Frame -> index into `entries`
    frame_map: Vec<usize>,

    commands: BTreeMap<usize, FrameCommands>,
    comments: BTreeMap<usize, Vec<Comment>>,
    fast_forwards: BTreeMap<usize, FastForwardMarker>,
    labels: BTreeMap<usize, FastForwardMarker>,

    used_files: HashMap<PathBuf, FileStamp>,
    needs_reload: bool,

    current_frame: usize,
    frame_in_input: u32,
    next_label: Option<FastForwardMarker>,
}

impl Timeline {
    /// Empty timeline for `root`; the first refresh parses it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
            frame_map: Vec::new(),
            commands: BTreeMap::new(),
            comments: BTreeMap::new(),
            fast_forwards: BTreeMap::new(),
            labels: BTreeMap::new(),
            used_files: HashMap::new(),
            needs_reload: true,
            current_frame: 0,
            frame_in_input: 0,
            next_label: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Total simulation frames.
    pub fn len(&self) -> usize {
        self.frame_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_map.is_empty()
    }

    /// Distinct action lines in frame order.
    pub fn entries(&self) -> &[InputFrame] {
        &self.entries
    }

    pub fn input_at(&self, frame: usize) -> Option<&InputFrame> {
        self.frame_map.get(frame).map(|&entry| &self.entries[entry])
    }

    // === Cursors ===

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Ticks elapsed inside the current action line.
    pub fn frame_in_input(&self) -> u32 {
        self.frame_in_input
    }

    pub fn current(&self) -> Option<&InputFrame> {
        self.input_at(self.current_frame)
    }

    pub fn previous(&self) -> Option<&InputFrame> {
        self.current_frame
            .checked_sub(1)
            .and_then(|frame| self.input_at(frame))
    }

    pub fn next(&self) -> Option<&InputFrame> {
        self.input_at(self.current_frame + 1)
    }

    pub fn can_playback(&self) -> bool {
        self.current_frame < self.len()
    }

    /// Move both cursors past the current frame.
    pub(crate) fn advance_cursor(&mut self) {
        let same_input = match (self.current(), self.previous()) {
            (Some(current), Some(previous)) => current.same_line_as(previous),
            _ => false,
        };
        if self.frame_in_input == 0 || same_input {
            self.frame_in_input += 1;
        } else {
            self.frame_in_input = 1;
        }
        self.current_frame += 1;
    }

    /// Rewind to the start and forget any label target.
    pub fn stop(&mut self) {
        self.current_frame = 0;
        self.frame_in_input = 0;
        self.next_label = None;
    }

    /// Adopt the cursors of `other`, typically a snapshot taken at a save-state.
    pub fn copy_progress_from(&mut self, other: &Timeline) {
        self.current_frame = other.current_frame.min(self.len());
        self.frame_in_input = other.frame_in_input;
    }

    // === Commands and comments ===

    pub fn commands_at(&self, frame: usize) -> &[Command] {
        self.commands
            .get(&frame)
            .map(|commands| commands.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_commands(&self) -> &[Command] {
        self.commands_at(self.current_frame)
    }

    /// Every command in frame order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().flatten()
    }

    pub(crate) fn commands_mut(&mut self) -> impl Iterator<Item = &mut Command> {
        self.commands.values_mut().flatten()
    }

    pub fn comments_at(&self, frame: usize) -> &[Comment] {
        self.comments
            .get(&frame)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values().flatten()
    }

    pub fn fast_forwards(&self) -> impl Iterator<Item = &FastForwardMarker> {
        self.fast_forwards.values()
    }

    /// Label markers, including the hidden one at the end of the root script.
    pub fn labels(&self) -> impl Iterator<Item = &FastForwardMarker> {
        self.labels.values()
    }

    /// Every file read while parsing.
    pub fn used_files(&self) -> impl Iterator<Item = &Path> {
        self.used_files.keys().map(PathBuf::as_path)
    }

    // === Checksums ===

    /// Digest of everything before `upto_frame`.
    pub fn checksum(&self, upto_frame: usize) -> String {
        crate::checksum::compute_checksum(self, upto_frame)
    }

    /// Digest of the whole timeline.
    pub fn full_checksum(&self) -> String {
        self.checksum(self.len())
    }

    // === Building (parser only) ===

    pub(crate) fn push_input(&mut self, input: InputFrame) {
        let entry = self.entries.len();
        let duration = input.duration() as usize;
        self.entries.push(input);
        self.frame_map.extend(std::iter::repeat_n(entry, duration));
    }

    pub(crate) fn add_command(&mut self, command: Command) {
        self.commands.entry(command.frame).or_default().push(command);
    }

    pub(crate) fn add_comment(&mut self, comment: Comment) {
        self.comments.entry(comment.frame).or_default().push(comment);
    }

    /// A save-state marker is never replaced by a plain one at the same frame.
    pub(crate) fn add_fast_forward(&mut self, marker: FastForwardMarker) {
        if let Some(existing) = self.fast_forwards.get(&marker.frame)
            && existing.save_state
            && !marker.save_state
        {
            return;
        }
        self.fast_forwards.insert(marker.frame, marker);
    }

    pub(crate) fn add_label(&mut self, marker: FastForwardMarker) {
        self.labels.insert(marker.frame, marker);
    }

    /// Tag inputs starting at or after `start_frame` as iteration `index` of `count`.
    pub(crate) fn tag_repeat(&mut self, start_frame: usize, index: u32, count: u32) {
        for input in self
            .entries
            .iter_mut()
            .rev()
            .take_while(|input| input.frame_offset >= start_frame)
        {
            input.repeat_index = index;
            input.repeat_count = count;
        }
    }
}
