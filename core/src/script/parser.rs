//! Line-by-line script parser
//!
//! Every line lands at the frame reached so far (`timeline.len()`):
//! action lines append frames, directives are bound to the current frame,
//! `***` lines become fast-forward markers and `#` lines become comments
//! and labels. `Read`, `Play`, `Repeat` and `EndRepeat` feed further lines
//! back into the parser.

use hashbrown::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tasrun_shared::{ActionLine, CommandLine, LineKind};

use super::ScriptError;
use super::include::{find_line, resolve_read_target, same_file};
use crate::command::{Command, CommandDescriptor, CommandRegistry, ExecuteTiming, Structural};
use crate::config::PlaybackConfig;
use crate::context::PlaybackContext;
use crate::input::{InputFrame, SourceLocation};
use crate::timeline::{Comment, FastForwardMarker, Timeline};

type Lines = Rc<[String]>;

/// A `Repeat` waiting for its `EndRepeat`.
#[derive(Debug)]
struct OpenRepeat {
    file: PathBuf,
    line: usize,
    count: u32,
    start_frame: usize,
}

/// Builds one [`Timeline`] from a root script.
pub struct ScriptParser<'a> {
    registry: &'a CommandRegistry,
    ctx: &'a mut PlaybackContext,
    config: &'a PlaybackConfig,
    root: PathBuf,
    timeline: Timeline,
    /// File contents read during this parse
    files: HashMap<PathBuf, Lines>,
    /// Active `Read` directives, for cycle detection
    read_stack: Vec<String>,
    repeats: Vec<OpenRepeat>,
    /// (index, count) tag for inputs produced right now
    repeat: (u32, u32),
}

impl<'a> ScriptParser<'a> {
    /// Parse `root` and everything it includes.
    ///
    /// Parse-time directives run against `ctx`.
    pub fn parse(
        root: &Path,
        registry: &'a CommandRegistry,
        ctx: &'a mut PlaybackContext,
        config: &'a PlaybackConfig,
    ) -> Result<Timeline, ScriptError> {
        if !root.is_file() {
            return Err(ScriptError::MissingRoot(root.to_path_buf()));
        }

        ctx.begin_parse();
        let mut parser = ScriptParser {
            registry,
            ctx,
            config,
            root: root.to_path_buf(),
            timeline: Timeline::new(root),
            files: HashMap::new(),
            read_stack: Vec::new(),
            repeats: Vec::new(),
            repeat: (0, 0),
        };

        let lines = parser.load(root)?;
        parser.read_lines(root, lines.clone(), 0, usize::MAX, 0);
        parser.finish(lines.len());

        let mut timeline = parser.timeline;
        timeline.mark_parsed();
        Ok(timeline)
    }

    fn load(&mut self, path: &Path) -> Result<Lines, ScriptError> {
        if let Some(lines) = self.files.get(path) {
            return Ok(lines.clone());
        }

        // Stamp before reading so a write racing with us is seen next time
        self.timeline.track_file(path);
        let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lines: Lines = content.lines().map(str::to_string).collect();
        self.files.insert(path.to_path_buf(), lines.clone());
        Ok(lines)
    }

    /// Parse lines `start..=end` (1-based, 0 meaning the first) of `path`.
    ///
    /// Returns false when a `Play` took over and the caller must stop reading.
    fn read_lines(
        &mut self,
        path: &Path,
        lines: Lines,
        start: usize,
        end: usize,
        studio_line: usize,
    ) -> bool {
        let is_root = path == self.root;
        let mut studio_line = studio_line;

        let skip = start.saturating_sub(1);
        for (index, text) in lines.iter().enumerate().take(end).skip(skip) {
            if !self.read_line(text, path, index + 1, studio_line) {
                return false;
            }
            if is_root {
                studio_line += 1;
            }
        }
        true
    }

    fn read_line(&mut self, text: &str, path: &Path, file_line: usize, studio_line: usize) -> bool {
        let frame = self.timeline.len();

        match LineKind::classify(text) {
            LineKind::Command(line) => match self.registry.resolve(&line.name) {
                Some(descriptor) => {
                    let descriptor = *descriptor;
                    return self.run_command(descriptor, line, path, file_line, studio_line, frame);
                }
                None => log::warn!(
                    "Unknown command '{}' at {} line {}",
                    line.name,
                    path.display(),
                    file_line
                ),
            },
            LineKind::FastForward(line) => {
                let speed = self.config.default_speed();
                self.timeline
                    .add_fast_forward(FastForwardMarker::from_line(frame, studio_line, line, speed));
            }
            LineKind::Comment(comment) => {
                if comment.is_label() {
                    let speed = self.config.default_speed();
                    self.timeline
                        .add_label(FastForwardMarker::label(frame, studio_line, speed));
                }
                self.timeline.add_comment(Comment {
                    frame,
                    source: SourceLocation::new(path, file_line),
                    studio_line,
                    text: comment.text,
                });
            }
            LineKind::Action(line) => self.add_frames(line, path, file_line, studio_line),
            LineKind::Empty => {}
            LineKind::Unknown => log::debug!(
                "Skipping unparseable line {} of {}: {}",
                file_line,
                path.display(),
                text.trim()
            ),
        }
        true
    }

    fn add_frames(&mut self, mut line: ActionLine, path: &Path, file_line: usize, studio_line: usize) {
        line.frames = line.frames.min(self.config.max_frames_per_line());
        if line.frames == 0 {
            return;
        }

        let (index, count) = self.repeat;
        let input = InputFrame::new(
            line,
            SourceLocation::new(path, file_line),
            studio_line,
            self.timeline.len(),
        )
        .with_repeat(index, count);
        self.timeline.push_input(input);
    }

    fn run_command(
        &mut self,
        descriptor: CommandDescriptor,
        line: CommandLine,
        path: &Path,
        file_line: usize,
        studio_line: usize,
        frame: usize,
    ) -> bool {
        let command = Command::new(frame, descriptor, line, path, file_line, studio_line);

        let mut keep_reading = true;
        if command.runs_at(ExecuteTiming::PARSE) {
            match descriptor.structural() {
                Some(kind) => keep_reading = self.run_structural(kind, &command),
                None => {
                    self.ctx.parsing = true;
                    let result = command.invoke(self.ctx, &self.timeline);
                    self.ctx.parsing = false;
                    if let Err(error) = result {
                        log::warn!("\"{}\" at {} failed: {}", command.line_text, command.source, error);
                    }
                }
            }
        }

        // Bound to the frame before the command ran, even if it inserted inputs
        self.timeline.add_command(command);
        keep_reading
    }

    fn run_structural(&mut self, kind: Structural, command: &Command) -> bool {
        match kind {
            Structural::Read => self.read(command),
            Structural::Play => {
                self.play(command);
                // The rest of the current file is replaced by the jump target
                return false;
            }
            Structural::Repeat => self.repeat(command),
            Structural::EndRepeat => return self.end_repeat(command),
        }
        true
    }

    // "Read, Path", "Read, Path, StartLabel", "Read, Path, StartLabel, EndLabel"
    fn read(&mut self, command: &Command) {
        let Some(target) = command.args.first().filter(|arg| !arg.is_empty()) else {
            log::warn!("{}: Read command has no file name", command.source);
            return;
        };

        let file = &command.source.file;
        let dir = match file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().unwrap_or_default(),
        };

        let resolved = match resolve_read_target(&dir, target) {
            Ok(resolved) => resolved,
            Err(error) => {
                log::warn!("\"{}\" at {} failed: {}", command.line_text, command.source, error);
                return;
            }
        };
        if same_file(&resolved, file) {
            log::warn!(
                "\"{}\" at {} failed: a file cannot read itself",
                command.line_text,
                command.source
            );
            return;
        }

        let lines = match self.load(&resolved) {
            Ok(lines) => lines,
            Err(error) => {
                log::warn!("\"{}\" at {} failed: {}", command.line_text, command.source, error);
                return;
            }
        };

        let mut bounds = [0, usize::MAX];
        for (bound, arg) in bounds.iter_mut().zip(command.args.iter().skip(1)) {
            match find_line(arg, &lines) {
                Some(line) => *bound = line,
                None => {
                    log::warn!(
                        "\"{}\" at {} failed: {} is not a line or label",
                        command.line_text,
                        command.source,
                        arg
                    );
                    return;
                }
            }
        }

        let detail = format!("{}: {}", command.canonical_text(), command.source);
        if self.read_stack.contains(&detail) {
            log::warn!(
                "Multiple read commands lead to dead loops:\n{}",
                self.read_stack.join("\n")
            );
            return;
        }

        self.read_stack.push(detail);
        let [start, end] = bounds;
        self.read_lines(&resolved, lines, start, end, command.studio_line);
        self.read_stack.pop();
    }

    // "Play, StartLabel", "Play, StartLabel, FramesToWait"
    fn play(&mut self, command: &Command) {
        let Some(target) = command.args.first() else {
            log::warn!("{}: Play command has no starting label", command.source);
            return;
        };

        let root = self.root.clone();
        let lines = match self.load(&root) {
            Ok(lines) => lines,
            Err(error) => {
                log::warn!("\"{}\" at {} failed: {}", command.line_text, command.source, error);
                return;
            }
        };
        let Some(start) = find_line(target, &lines) else {
            log::warn!(
                "\"{}\" at {} failed: {} is not a line or label",
                command.line_text,
                command.source,
                target
            );
            return;
        };

        if let Some(wait) = command
            .args
            .get(1)
            .filter(|arg| arg.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|arg| ActionLine::parse(arg))
        {
            self.add_frames(wait, &command.source.file, command.source.line, command.studio_line);
        }

        if start <= command.studio_line + 1 {
            log::warn!(
                "{}: Play command does not allow playback from before the current line",
                command.source
            );
            return;
        }

        self.read_lines(&root, lines, start, usize::MAX, start - 1);
    }

    // "Repeat, Count"
    fn repeat(&mut self, command: &Command) {
        let Some(arg) = command.args.first() else {
            log::warn!("{}: Repeat command has no count specified", command.source);
            return;
        };
        let Ok(count) = arg.parse::<u32>() else {
            log::warn!("{}: Repeat command's count is not an integer", command.source);
            return;
        };
        if count < 1 {
            log::warn!("{}: Repeat command's count must be greater than 0", command.source);
            return;
        }

        self.repeats.push(OpenRepeat {
            file: command.source.file.clone(),
            line: command.source.line,
            count,
            start_frame: self.timeline.len(),
        });
    }

    /// Returns false when a `Play` in a later iteration took over.
    fn end_repeat(&mut self, command: &Command) -> bool {
        let Some(open) = self.repeats.pop() else {
            log::warn!(
                "{}: EndRepeat command does not have a paired Repeat command",
                command.source
            );
            return true;
        };
        if open.file != command.source.file {
            log::warn!(
                "{}: EndRepeat closes a Repeat from {} line {}",
                command.source,
                open.file.display(),
                open.line
            );
            return true;
        }

        // Body excludes the Repeat and EndRepeat lines themselves
        let start = open.line + 1;
        let end = command.source.line.saturating_sub(1);
        if open.count <= 1 || end < start {
            return true;
        }

        let file = command.source.file.clone();
        let lines = match self.load(&file) {
            Ok(lines) => lines,
            Err(error) => {
                log::warn!("{}: {}", command.source, error);
                return true;
            }
        };

        // The body was already read once as ordinary lines
        self.timeline.tag_repeat(open.start_frame, 1, open.count);

        let studio_line = if file == self.root {
            start - 1
        } else {
            command.studio_line
        };
        let outer = self.repeat;
        let mut keep_reading = true;
        for index in 2..=open.count {
            self.repeat = (index, open.count);
            if !self.read_lines(&file, lines.clone(), start, end, studio_line) {
                keep_reading = false;
                break;
            }
        }
        self.repeat = outer;
        keep_reading
    }

    fn finish(&mut self, root_lines: usize) {
        for open in self.repeats.drain(..) {
            log::warn!(
                "{} line {}: Repeat command does not have a paired EndRepeat command",
                open.file.display(),
                open.line
            );
        }

        // Hidden label after the last line of the root script
        let end = self.timeline.len();
        let speed = self.config.default_speed();
        self.timeline
            .add_label(FastForwardMarker::label(end, root_lines, speed));
    }
}
