//! Play a script headlessly and generate a report

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use tasrun_core::{HeadlessConfig, HeadlessRunner, PlaybackConfig, StopReason};

#[derive(Args)]
pub struct RunArgs {
    /// Root script (defaults to the configured script)
    pub script: Option<PathBuf>,

    /// Output report file (JSON)
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Stop at the first breakpoint instead of playing through
    #[arg(long)]
    pub pause: bool,

    /// Maximum number of simulation ticks
    #[arg(long, default_value = "10000000")]
    pub max_ticks: u64,
}

/// Execute a script
pub fn execute(args: RunArgs, config: PlaybackConfig) -> Result<()> {
    let script = crate::resolve_script(args.script, &config)?;
    println!("Executing script: {}", script.display());
    println!("  Pause at breakpoints: {}", args.pause);
    println!("  Max ticks: {}", args.max_ticks);

    let headless = HeadlessConfig {
        max_ticks: args.max_ticks,
        pause_at_breakpoints: args.pause,
        script_path: None,
    };
    let mut runner = HeadlessRunner::from_file(&script, config, headless)?;
    let report = runner.execute()?;

    println!();
    println!("=== Playback Report ===");
    println!("Frames: {}/{}", report.frames_played, report.total_frames);
    println!("Ticks: {} in {} slices", report.ticks, report.slices);
    println!("Breakpoints: {:?}", report.breakpoints);
    println!("Save-states: {}", report.saves);
    println!("Host commands: {}", report.host_commands);
    println!("Checksum: {}", report.checksum);
    match &report.stop_reason {
        StopReason::EndOfScript => println!("Stopped: end of script"),
        StopReason::Breakpoint { frame } => println!("Stopped: breakpoint at frame {}", frame),
        StopReason::MaxTicks => println!("Stopped: tick limit reached"),
        StopReason::Disabled => println!("Stopped: playback disabled"),
    }

    if let Some(report_path) = args.report {
        let mut file = File::create(&report_path)
            .with_context(|| format!("Failed to create report file: {}", report_path.display()))?;
        file.write_all(report.to_json()?.as_bytes())
            .with_context(|| "Failed to write report")?;

        println!();
        println!("Report written to: {}", report_path.display());
    }

    tracing::info!("Played {} frames", report.frames_played);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("main.tas");
        let report = dir.path().join("report.json");
        std::fs::write(&script, "10,R\n***\n5,J\n").unwrap();

        execute(
            RunArgs {
                script: Some(script),
                report: Some(report.clone()),
                pause: false,
                max_ticks: 1000,
            },
            PlaybackConfig::default(),
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["frames_played"], 15);
        assert_eq!(json["stop_reason"]["reason"], "end_of_script");
        assert_eq!(json["breakpoints"][0], 10);
    }
}
