//! Breakpoints, labels and fast-forward speed.

use tasrun_shared::{CommentLine, FastForwardLine};

use super::Timeline;
use crate::input::SourceLocation;

/// A frame at which playback changes speed, pauses or saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastForwardMarker {
    pub frame: usize,
    pub studio_line: usize,
    /// Frames per real-time slice while approaching this marker
    pub speed: u32,
    pub save_state: bool,
    /// Pause here even when later markers exist
    pub force_stop: bool,
}

impl FastForwardMarker {
    pub fn from_line(
        frame: usize,
        studio_line: usize,
        line: FastForwardLine,
        default_speed: u32,
    ) -> Self {
        Self {
            frame,
            studio_line,
            speed: line.speed.unwrap_or(default_speed),
            save_state: line.save_state,
            force_stop: line.force_stop,
        }
    }

    /// Navigation-only marker for a `#Label` line.
    pub fn label(frame: usize, studio_line: usize, default_speed: u32) -> Self {
        Self {
            frame,
            studio_line,
            speed: default_speed,
            save_state: false,
            force_stop: false,
        }
    }
}

/// A `#` line, kept for navigation and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub frame: usize,
    pub source: SourceLocation,
    pub studio_line: usize,
    /// Text after the `#`
    pub text: String,
}

impl Comment {
    pub fn is_label(&self) -> bool {
        CommentLine {
            text: self.text.clone(),
        }
        .is_label()
    }
}

impl Timeline {
    /// The marker governing the current frame.
    ///
    /// In order: the first force-stop marker ahead, the label target set by
    /// [`Timeline::fast_forward_to_next_label`], the first marker ahead, the
    /// last marker.
    pub fn current_fast_forward(&self) -> Option<&FastForwardMarker> {
        let ahead = self.current_frame + 1..;
        self.fast_forwards
            .range(ahead.clone())
            .map(|(_, marker)| marker)
            .find(|marker| marker.force_stop)
            .or(self.next_label.as_ref())
            .or_else(|| self.fast_forwards.range(ahead).next().map(|(_, marker)| marker))
            .or_else(|| self.fast_forwards.values().next_back())
    }

    /// Whether the governing marker still lies ahead.
    pub fn has_fast_forward(&self) -> bool {
        self.current_fast_forward()
            .is_some_and(|marker| marker.frame > self.current_frame)
    }

    /// Simulation steps the host may run before yielding to real time.
    ///
    /// The marker's speed, clamped to the distance left so the driver never
    /// steps past the breakpoint; `1` without an active marker.
    pub fn fast_forward_speed(&self) -> u32 {
        match self.current_fast_forward() {
            Some(marker) if marker.frame > self.current_frame => {
                let distance = marker.frame - self.current_frame;
                let distance = u32::try_from(distance).unwrap_or(u32::MAX);
                marker.speed.min(distance).max(1)
            }
            _ => 1,
        }
    }

    /// True exactly on the frame of the governing marker, or on a force-stop marker.
    pub fn is_at_breakpoint(&self) -> bool {
        let frame = self.current_frame;
        self.current_fast_forward()
            .is_some_and(|marker| marker.frame == frame)
            || self
                .fast_forwards
                .get(&frame)
                .is_some_and(|marker| marker.force_stop)
    }

    /// Whether the marker at `frame` requests a save-state.
    pub fn save_state_marker_at(&self, frame: usize) -> bool {
        self.fast_forwards
            .get(&frame)
            .is_some_and(|marker| marker.save_state)
    }

    /// The breakpoint at the current frame, if it asks for a save-state.
    pub fn save_state_breakpoint(&self) -> Option<&FastForwardMarker> {
        if !self.is_at_breakpoint() {
            return None;
        }
        self.fast_forwards
            .get(&self.current_frame)
            .filter(|marker| marker.save_state)
    }

    /// Fast-forward to the next label, or to a real breakpoint before it.
    ///
    /// Returns the target frame.
    pub fn fast_forward_to_next_label(&mut self) -> Option<usize> {
        self.next_label = None;

        let next = self
            .labels
            .range(self.current_frame + 1..)
            .next()
            .map(|(_, marker)| marker.clone());
        let pending = self
            .current_fast_forward()
            .filter(|marker| marker.frame > self.current_frame)
            .cloned();

        self.next_label = match (next, pending) {
            (Some(next), Some(pending)) if next.frame > pending.frame => Some(pending),
            (next, _) => next,
        };
        self.next_label.as_ref().map(|marker| marker.frame)
    }

    pub fn label_target(&self) -> Option<&FastForwardMarker> {
        self.next_label.as_ref()
    }

    pub fn clear_label_target(&mut self) {
        self.next_label = None;
    }
}
