//! Script parsing
//!
//! Turns a root script and everything it includes into a [`Timeline`].
//! Parsing is lenient: malformed lines and failing directives are logged
//! and skipped. Only an unreadable root script is an error.
//!
//! [`Timeline`]: crate::timeline::Timeline

mod include;
mod parser;

pub use include::{ReadTargetError, find_line, resolve_read_target};
pub use parser::ScriptParser;

use std::path::PathBuf;

/// Error reading the root script
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
