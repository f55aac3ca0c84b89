//! Directives embedded in scripts
//!
//! Each directive name resolves through the [`CommandRegistry`] to a
//! [`CommandDescriptor`]: a handler with a fixed call shape plus timing,
//! legality and checksum metadata. A parsed occurrence is a [`Command`].

mod builtin;
mod metadata;
mod registry;

pub use builtin::BUILTIN_COMMANDS;
pub use metadata::{
    MetadataKind, MetadataRequest, update_metadata, update_metadata_at, update_record_count,
};
pub use registry::CommandRegistry;

use std::path::Path;

use tasrun_shared::CommandLine;

use crate::context::PlaybackContext;
use crate::input::SourceLocation;
use crate::timeline::Timeline;

bitflags::bitflags! {
    /// When a command's handler runs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecuteTiming: u8 {
        /// Once, while the script is parsed
        const PARSE = 0b01;
        /// Every tick that lands on the command's frame
        const RUNTIME = 0b10;
    }
}

/// Error raised by a command handler.
///
/// Handlers never abort playback; the caller logs the error and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{command}: missing argument <{name}>")]
    MissingArgument {
        command: &'static str,
        name: &'static str,
    },

    #[error("{command}: invalid argument '{value}': {reason}")]
    InvalidArgument {
        command: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Host refused a forwarded command
    #[error("host rejected command: {0}")]
    Host(String),
}

pub type BareHandler = fn(&mut PlaybackContext) -> Result<(), CommandError>;
pub type ArgsHandler = fn(&mut PlaybackContext, &[String]) -> Result<(), CommandError>;
pub type LocatedHandler =
    fn(&mut PlaybackContext, &Timeline, &Command) -> Result<(), CommandError>;

/// Directives the parser implements itself because they feed lines back
/// into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structural {
    Read,
    Play,
    Repeat,
    EndRepeat,
}

/// The closed set of handler call shapes.
#[derive(Debug, Clone, Copy)]
pub enum CommandHandler {
    /// No arguments
    Bare(BareHandler),
    /// Raw argument list
    Args(ArgsHandler),
    /// Arguments, timeline and source position (through the [`Command`])
    Located(LocatedHandler),
    Structural(Structural),
}

/// A registered directive.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub handler: CommandHandler,
    pub timing: ExecuteTiming,
    /// False for commands skipped while restricted mode is active.
    pub legal_in_full_game: bool,
    /// False for purely informational commands.
    pub calc_checksum: bool,
}

impl CommandDescriptor {
    /// Case-insensitive match against the name or any alias.
    pub fn is_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase() == name.to_lowercase())
    }

    pub fn structural(&self) -> Option<Structural> {
        match self.handler {
            CommandHandler::Structural(kind) => Some(kind),
            _ => None,
        }
    }
}

/// A directive bound to a timeline frame.
#[derive(Debug, Clone)]
pub struct Command {
    pub frame: usize,
    pub descriptor: CommandDescriptor,
    pub args: Vec<String>,
    pub source: SourceLocation,
    /// Root-file line (0-based) the command is attributed to.
    pub studio_line: usize,
    /// Trimmed source text, hashed verbatim by the checksum.
    pub line_text: String,
}

impl Command {
    pub fn new(
        frame: usize,
        descriptor: CommandDescriptor,
        line: CommandLine,
        file: &Path,
        file_line: usize,
        studio_line: usize,
    ) -> Self {
        Self {
            frame,
            descriptor,
            args: line.args,
            source: SourceLocation::new(file, file_line),
            studio_line,
            line_text: line.text,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn is(&self, name: &str) -> bool {
        self.descriptor.is_name(name)
    }

    pub fn runs_at(&self, timing: ExecuteTiming) -> bool {
        self.descriptor.timing.contains(timing)
    }

    /// Invoke the handler. Structural commands are a no-op here.
    pub fn invoke(
        &self,
        ctx: &mut PlaybackContext,
        timeline: &Timeline,
    ) -> Result<(), CommandError> {
        match self.descriptor.handler {
            CommandHandler::Bare(handler) => handler(ctx),
            CommandHandler::Args(handler) => handler(ctx, &self.args),
            CommandHandler::Located(handler) => handler(ctx, timeline, self),
            CommandHandler::Structural(_) => Ok(()),
        }
    }

    /// `Name, arg1, arg2` with the registered spelling of the name.
    pub fn canonical_text(&self) -> String {
        let mut out = self.descriptor.name.to_string();
        for arg in &self.args {
            out.push_str(", ");
            out.push_str(arg);
        }
        out
    }
}

/// A command forwarded to the host simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub kind: HostCommandKind,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommandKind {
    /// Host console line, e.g. `Console load 1`
    Console,
    /// Assign a host value, e.g. `Set, Player.Speed, 90`
    Set,
}

impl std::fmt::Display for HostCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.kind {
            HostCommandKind::Console => "Console",
            HostCommandKind::Set => "Set",
        };
        write!(f, "{}", name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
