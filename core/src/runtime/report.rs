//! Playback report types and serialization

/// Why a headless run returned.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Every frame was played
    EndOfScript,
    /// Paused on a breakpoint; running again resumes from here
    Breakpoint { frame: usize },
    /// Tick limit reached
    MaxTicks,
    /// Playback was disabled
    Disabled,
}

/// Playback report
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlaybackReport {
    /// Report format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Root script (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Execution timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<String>,
    /// Execution duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Frames whose input reached the host
    pub frames_played: u64,
    /// Frames in the script
    pub total_frames: u64,
    /// Driver calls, including skipped loading ticks
    pub ticks: u64,
    /// Real-time slices the ticks were grouped into
    pub slices: u64,
    /// Frames at which a breakpoint was reached
    pub breakpoints: Vec<usize>,
    /// Save-states taken at `***S` breakpoints
    pub saves: u64,
    /// `Console`/`Set` directives forwarded to the host
    pub host_commands: u64,
    /// Checksum of the whole timeline when the run returned
    pub checksum: String,
    pub stop_reason: StopReason,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl PlaybackReport {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
