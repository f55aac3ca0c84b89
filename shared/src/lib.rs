//! Line grammar shared by every tasrun crate.
//!
//! A script is a sequence of lines, each of which is one of:
//! - an action line (`15,R,J`), see [`ActionLine`]
//! - a fast-forward line (`***!S200`), see [`FastForwardLine`]
//! - a comment or label (`#lvl_1`), see [`CommentLine`]
//! - a directive (`Read, 1A.tas, Start`), see [`CommandLine`]
//!
//! Nothing here knows about frames or playback; the core crate builds the
//! timeline out of these pieces.

pub mod action_line;
pub mod actions;
pub mod command_line;
pub mod comment_line;
pub mod fast_forward_line;

pub use action_line::ActionLine;
pub use actions::Actions;
pub use command_line::CommandLine;
pub use comment_line::CommentLine;
pub use fast_forward_line::FastForwardLine;

/// Upper bound on the duration of a single action line.
pub const MAX_FRAMES: u32 = 9999;

/// Classification of a trimmed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Empty,
    Comment(CommentLine),
    FastForward(FastForwardLine),
    Action(ActionLine),
    /// Starts with a letter; may or may not be a registered directive.
    Command(CommandLine),
    /// Anything else. Skipped by the parser.
    Unknown,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return LineKind::Empty;
        }
        if let Some(comment) = CommentLine::parse(line) {
            return LineKind::Comment(comment);
        }
        if let Some(ff) = FastForwardLine::parse(line) {
            return LineKind::FastForward(ff);
        }
        if let Some(action) = ActionLine::parse(line) {
            return LineKind::Action(action);
        }
        if let Some(command) = CommandLine::parse(line) {
            return LineKind::Command(command);
        }
        LineKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_kind() {
        assert_eq!(LineKind::classify("   "), LineKind::Empty);
        assert!(matches!(LineKind::classify("#start"), LineKind::Comment(_)));
        assert!(matches!(LineKind::classify("***10"), LineKind::FastForward(_)));
        assert!(matches!(LineKind::classify("  12,R,J"), LineKind::Action(_)));
        assert!(matches!(LineKind::classify("Read, a.tas"), LineKind::Command(_)));
        assert_eq!(LineKind::classify("?!"), LineKind::Unknown);
    }
}
