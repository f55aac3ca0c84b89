//! Timeline checksums
//!
//! The digest covers the root path, the canonical action tokens of every
//! frame before the cutoff and the source text of checksum-relevant
//! commands on those frames. Save-states store it to detect edits made
//! before the saved frame.

use std::fmt::Write as _;

use xxhash_rust::xxh3::Xxh3;

use crate::timeline::Timeline;

/// Hex digest of everything in `timeline` before `upto_frame`.
///
/// `upto_frame` is clamped to the timeline length. Durations are not hashed
/// directly: splitting `10,R` into two `5,R` lines yields the same digest.
pub fn compute_checksum(timeline: &Timeline, upto_frame: usize) -> String {
    let mut hasher = Xxh3::new();
    let mut line = String::new();

    line.push_str(&timeline.root().display().to_string());
    line.push('\n');
    hasher.update(line.as_bytes());

    for frame in 0..upto_frame.min(timeline.len()) {
        line.clear();
        if let Some(input) = timeline.input_at(frame) {
            line.push_str(input.tokens());
        }
        line.push('\n');

        for command in timeline
            .commands_at(frame)
            .iter()
            .filter(|command| command.descriptor.calc_checksum)
        {
            line.push_str(&command.line_text);
            line.push('\n');
        }
        hasher.update(line.as_bytes());
    }

    let mut out = String::with_capacity(32);
    // Writing to a String cannot fail
    let _ = write!(out, "{:032x}", hasher.digest128());
    out
}
