//! Print a timeline checksum

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use tasrun_core::PlaybackConfig;

#[derive(Args)]
pub struct ChecksumArgs {
    /// Root script (defaults to the configured script)
    pub script: Option<PathBuf>,

    /// Hash frames before this one (defaults to the whole script)
    #[arg(short, long)]
    pub frame: Option<usize>,
}

/// Print the checksum
pub fn execute(args: ChecksumArgs, config: &PlaybackConfig) -> Result<()> {
    let script = crate::resolve_script(args.script, config)?;
    let (timeline, _) = crate::validate::parse(&script, config)?;

    let frame = args.frame.unwrap_or(timeline.len()).min(timeline.len());
    if args.frame.is_some_and(|requested| requested > timeline.len()) {
        tracing::warn!(
            "Frame clamped to the end of the script ({} frames)",
            timeline.len()
        );
    }

    println!("{}  {} (frames 0..{})", timeline.checksum(frame), script.display(), frame);
    Ok(())
}
