//! `***` breakpoint lines.

/// Parsed `***[!][S][speed][S]` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FastForwardLine {
    /// `!`: pause here even when later markers exist.
    pub force_stop: bool,
    /// `S`: request a save-state when playback reaches this marker.
    pub save_state: bool,
    /// Frames per slice; `None` uses the configured default.
    pub speed: Option<u32>,
}

impl FastForwardLine {
    pub const SIGIL: &'static str = "***";

    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim().strip_prefix(Self::SIGIL)?.trim();
        let mut result = FastForwardLine::default();

        if let Some(stripped) = rest.strip_prefix('!') {
            result.force_stop = true;
            rest = stripped.trim_start();
        }
        if let Some(stripped) = rest.strip_prefix(['s', 'S']) {
            result.save_state = true;
            rest = stripped.trim_start();
        }
        if let Some(stripped) = rest.strip_suffix(['s', 'S']) {
            result.save_state = true;
            rest = stripped.trim_end();
        }

        result.speed = rest.parse::<u32>().ok().filter(|&speed| speed > 0);
        Some(result)
    }
}
