//! Parse a script without playing it

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tasrun_core::{CommandRegistry, PlaybackConfig, PlaybackContext, ScriptParser, Timeline};

#[derive(Args)]
pub struct ValidateArgs {
    /// Root script (defaults to the configured script)
    pub script: Option<PathBuf>,
}

/// Validate a script
pub fn execute(args: ValidateArgs, config: &PlaybackConfig) -> Result<()> {
    let script = crate::resolve_script(args.script, config)?;
    println!("Validating script: {}", script.display());

    let (timeline, ctx) = parse(&script, config)?;

    println!();
    println!("=== Script Valid ===");
    println!("Frames: {}", timeline.len());
    println!("Input lines: {}", timeline.entries().len());
    println!("Commands: {}", timeline.commands().count());
    println!("Comments: {}", timeline.comments().count());
    // The hidden end-of-script label is not written by the user
    println!("Labels: {}", timeline.labels().count().saturating_sub(1));

    let markers = timeline.fast_forwards().count();
    let save_markers = timeline.fast_forwards().filter(|m| m.save_state).count();
    println!("Fast-forward markers: {} ({} save-state)", markers, save_markers);
    println!("Restricted mode: {}", ctx.enforce_legal);

    let mut files: Vec<_> = timeline.used_files().collect();
    files.sort();
    println!();
    println!("=== Files ===");
    for file in files {
        println!("  {}", file.display());
    }

    println!();
    println!("Checksum: {}", timeline.full_checksum());
    Ok(())
}

/// Parse `script` with the built-in directives.
pub(crate) fn parse(
    script: &std::path::Path,
    config: &PlaybackConfig,
) -> Result<(Timeline, PlaybackContext)> {
    let registry = CommandRegistry::builtin();
    let mut ctx = PlaybackContext::new();
    let timeline = ScriptParser::parse(script, &registry, &mut ctx, config)
        .with_context(|| format!("Failed to parse script: {}", script.display()))?;
    Ok((timeline, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tas");
        std::fs::write(&path, "EnforceLegal\n#Start\n10,R\n***S\n5,J\n").unwrap();

        let (timeline, ctx) = parse(&path, &PlaybackConfig::default()).unwrap();
        assert_eq!(timeline.len(), 15);
        assert_eq!(timeline.labels().count(), 2);
        assert!(ctx.enforce_legal);
    }

    #[test]
    fn test_missing_script_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(
            ValidateArgs {
                script: Some(dir.path().join("missing.tas")),
            },
            &PlaybackConfig::default(),
        );
        assert!(result.is_err());
    }
}
