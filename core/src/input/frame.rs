use std::fmt;
use std::path::{Path, PathBuf};

use tasrun_shared::{ActionLine, Actions};

/// File and 1-based line a parsed entity came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: &Path, line: usize) -> Self {
        Self {
            file: file.to_path_buf(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}", self.file.display(), self.line)
    }
}

/// One action line expanded into the timeline.
///
/// Stored once and referenced by every frame it covers. Immutable after
/// parsing apart from the repeat tags, which `EndRepeat` fills in for the
/// first pass of its body.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFrame {
    line: ActionLine,
    tokens: String,
    pub source: SourceLocation,
    /// Root-file line highlighted while this input plays (0-based).
    pub studio_line: usize,
    /// 1-based iteration inside an unrolled `Repeat`, 0 outside one.
    pub repeat_index: u32,
    pub repeat_count: u32,
    /// First timeline frame covered by this input.
    pub frame_offset: usize,
}

impl InputFrame {
    pub fn new(
        line: ActionLine,
        source: SourceLocation,
        studio_line: usize,
        frame_offset: usize,
    ) -> Self {
        Self {
            tokens: line.action_tokens(),
            line,
            source,
            studio_line,
            repeat_index: 0,
            repeat_count: 0,
            frame_offset,
        }
    }

    pub fn with_repeat(mut self, index: u32, count: u32) -> Self {
        self.repeat_index = index;
        self.repeat_count = count;
        self
    }

    pub fn duration(&self) -> u32 {
        self.line.frames
    }

    pub fn actions(&self) -> Actions {
        self.line.actions
    }

    pub fn has_actions(&self, actions: Actions) -> bool {
        self.line.actions.intersects(actions)
    }

    /// Feather angle in degrees, 0 when omitted.
    pub fn angle(&self) -> f32 {
        self.line.angle()
    }

    /// Feather magnitude cap, 1.0 when omitted.
    pub fn magnitude(&self) -> f32 {
        self.line.magnitude()
    }

    pub fn action_line(&self) -> &ActionLine {
        &self.line
    }

    /// Canonical action tokens without the duration; what the checksum hashes.
    pub fn tokens(&self) -> &str {
        &self.tokens
    }

    /// Frames covered, as a half-open range of timeline indices.
    pub fn frames(&self) -> std::ops::Range<usize> {
        self.frame_offset..self.frame_offset + self.duration() as usize
    }

    /// Whether `other` comes from the same script line and repeat iteration.
    pub fn same_line_as(&self, other: &InputFrame) -> bool {
        self.studio_line == other.studio_line
            && self.repeat_index == other.repeat_index
            && self.frame_offset == other.frame_offset
    }

    /// ` 2/3` inside a repeat block, empty otherwise.
    pub fn repeat_label(&self) -> String {
        if self.repeat_count > 1 {
            format!(" {}/{}", self.repeat_index, self.repeat_count)
        } else {
            String::new()
        }
    }
}

impl fmt::Display for InputFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str, offset: usize) -> InputFrame {
        InputFrame::new(
            ActionLine::parse(text).unwrap(),
            SourceLocation::new(Path::new("a.tas"), 1),
            0,
            offset,
        )
    }

    #[test]
    fn test_accessors() {
        let input = frame("12,R,X,F,90,0.5", 3);
        assert_eq!(input.duration(), 12);
        assert!(input.has_actions(Actions::RIGHT));
        assert!(!input.has_actions(Actions::LEFT));
        assert_eq!(input.angle(), 90.0);
        assert_eq!(input.magnitude(), 0.5);
        assert_eq!(input.frames(), 3..15);
        assert_eq!(input.tokens(), "R,X,F,90,0.5");
        assert_eq!(input.to_string(), "12,R,X,F,90,0.5");
    }

    #[test]
    fn test_repeat_label() {
        let input = frame("1", 0);
        assert_eq!(input.repeat_label(), "");
        let input = input.with_repeat(2, 3);
        assert_eq!(input.repeat_label(), " 2/3");
    }

    #[test]
    fn test_same_line_requires_matching_iteration() {
        let a = frame("1,J", 0).with_repeat(1, 2);
        let b = frame("1,J", 1).with_repeat(2, 2);
        assert!(a.same_line_as(&a.clone()));
        assert!(!a.same_line_as(&b));
    }
}
