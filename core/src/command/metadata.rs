//! Informational directives that rewrite their own script line.
//!
//! `RecordCount: 12` counts re-parses that changed the timeline checksum;
//! `FileTime`, `ChapterTime` and `RoomName` record values reported by the host.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::Command;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    RecordCount,
    FileTime,
    ChapterTime,
    RoomName,
}

impl MetadataKind {
    pub fn command_name(self) -> &'static str {
        match self {
            MetadataKind::RecordCount => "RecordCount",
            MetadataKind::FileTime => "FileTime",
            MetadataKind::ChapterTime => "ChapterTime",
            MetadataKind::RoomName => "RoomName",
        }
    }
}

/// A runtime handler asking for its line to be filled with a host value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    pub kind: MetadataKind,
    pub file: PathBuf,
    pub line: usize,
}

impl MetadataRequest {
    pub fn for_command(kind: MetadataKind, command: &Command) -> Self {
        Self {
            kind,
            file: command.source.file.clone(),
            line: command.source.line,
        }
    }
}

/// Increment every `RecordCount` in the root script.
///
/// Returns how many lines were rewritten.
pub fn update_record_count(timeline: &mut Timeline) -> std::io::Result<usize> {
    update_matching(timeline, MetadataKind::RecordCount, |command| {
        let current = command.args.first().map_or("0", String::as_str);
        let count = if current.is_empty() { Some(0) } else { current.parse::<u64>().ok() };
        count.map(|count| (count + 1).to_string())
    })
}

/// Write `value` into every root-script command of `kind` whose argument
/// differs from it.
pub fn update_metadata(
    timeline: &mut Timeline,
    kind: MetadataKind,
    value: &str,
) -> std::io::Result<usize> {
    if value.is_empty() {
        return Ok(0);
    }
    update_matching(timeline, kind, |_| Some(value.to_string()))
}

/// Like [`update_metadata`], limited to the command at `file`:`line`.
pub fn update_metadata_at(
    timeline: &mut Timeline,
    request: &MetadataRequest,
    value: &str,
) -> std::io::Result<usize> {
    if value.is_empty() {
        return Ok(0);
    }
    update_where(timeline, request.kind, |command| {
        (command.source.file == request.file && command.source.line == request.line)
            .then(|| value.to_string())
    })
}

fn update_matching(
    timeline: &mut Timeline,
    kind: MetadataKind,
    value: impl Fn(&Command) -> Option<String>,
) -> std::io::Result<usize> {
    let root = timeline.root().to_path_buf();
    update_where(timeline, kind, |command| {
        if command.source.file == root {
            value(command)
        } else {
            None
        }
    })
}

fn update_where(
    timeline: &mut Timeline,
    kind: MetadataKind,
    value: impl Fn(&Command) -> Option<String>,
) -> std::io::Result<usize> {
    let name = kind.command_name();

    // file -> (1-based line -> replacement)
    let mut updates: BTreeMap<PathBuf, BTreeMap<usize, String>> = BTreeMap::new();
    for command in timeline.commands_mut().filter(|command| command.is(name)) {
        let Some(metadata) = value(command) else {
            continue;
        };
        if command.args.first() == Some(&metadata) {
            continue;
        }

        let text = format!("{}: {}", name, metadata);
        updates
            .entry(command.source.file.clone())
            .or_default()
            .insert(command.source.line, text.clone());
        command.args = vec![metadata];
        command.line_text = text;
    }

    let mut written = 0;
    for (file, lines) in &updates {
        rewrite_lines(file, lines)?;
        timeline.restamp_file(file);
        written += lines.len();
    }
    if written > 0 {
        log::debug!("Updated {} {} line(s)", written, name);
    }
    Ok(written)
}

/// Replace 1-based lines of `path`, keeping its line endings.
pub(crate) fn rewrite_lines(path: &Path, updates: &BTreeMap<usize, String>) -> std::io::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let trailing = content.ends_with('\n');

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    for (&line, text) in updates {
        if let Some(slot) = line.checked_sub(1).and_then(|index| lines.get_mut(index)) {
            *slot = text.clone();
        }
    }

    let mut output = lines.join(newline);
    if trailing {
        output.push_str(newline);
    }
    std::fs::write(path, output)
}
