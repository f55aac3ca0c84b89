//! Built-in directive table.

use super::metadata::MetadataKind;
use super::{
    Command, CommandDescriptor, CommandError, CommandHandler, ExecuteTiming, HostCommand,
    HostCommandKind, MetadataRequest, Structural,
};
use crate::context::PlaybackContext;
use crate::timeline::Timeline;

const PARSE: ExecuteTiming = ExecuteTiming::PARSE;
const RUNTIME: ExecuteTiming = ExecuteTiming::RUNTIME;
const BOTH: ExecuteTiming = ExecuteTiming::PARSE.union(ExecuteTiming::RUNTIME);

const fn command(
    name: &'static str,
    aliases: &'static [&'static str],
    handler: CommandHandler,
    timing: ExecuteTiming,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        aliases,
        handler,
        timing,
        legal_in_full_game: true,
        calc_checksum: true,
    }
}

const fn illegal(mut descriptor: CommandDescriptor) -> CommandDescriptor {
    descriptor.legal_in_full_game = false;
    descriptor
}

const fn informational(mut descriptor: CommandDescriptor) -> CommandDescriptor {
    descriptor.calc_checksum = false;
    descriptor
}

pub static BUILTIN_COMMANDS: &[CommandDescriptor] = &[
    // "Read, Path", "Read, Path, StartLabel", "Read, Path, StartLabel, EndLabel"
    command("Read", &[], CommandHandler::Structural(Structural::Read), PARSE),
    // "Play, StartLabel", "Play, StartLabel, FramesToWait"
    command("Play", &[], CommandHandler::Structural(Structural::Play), PARSE),
    command("Repeat", &[], CommandHandler::Structural(Structural::Repeat), PARSE),
    command("EndRepeat", &[], CommandHandler::Structural(Structural::EndRepeat), PARSE),
    command("Safe", &[], CommandHandler::Bare(safe), BOTH),
    command("Unsafe", &[], CommandHandler::Bare(unsafe_mode), BOTH),
    command("EnforceLegal", &[], CommandHandler::Bare(enforce_legal), PARSE),
    illegal(command("Console", &[], CommandHandler::Args(console), RUNTIME)),
    illegal(command("Set", &[], CommandHandler::Args(set), RUNTIME)),
    command("Press", &[], CommandHandler::Args(press), RUNTIME),
    informational(command(
        "RecordCount",
        &["RecordCount:", "RecordCount："],
        CommandHandler::Bare(no_op),
        RUNTIME,
    )),
    informational(command(
        "FileTime",
        &["FileTime:", "FileTime："],
        CommandHandler::Bare(no_op),
        RUNTIME,
    )),
    informational(command(
        "ChapterTime",
        &["ChapterTime:", "ChapterTime："],
        CommandHandler::Bare(no_op),
        RUNTIME,
    )),
    informational(command(
        "RoomName",
        &["RoomName:", "RoomName："],
        CommandHandler::Located(room_name),
        RUNTIME,
    )),
];

fn safe(ctx: &mut PlaybackContext) -> Result<(), CommandError> {
    ctx.allow_unsafe = false;
    Ok(())
}

fn unsafe_mode(ctx: &mut PlaybackContext) -> Result<(), CommandError> {
    ctx.allow_unsafe = true;
    Ok(())
}

fn enforce_legal(ctx: &mut PlaybackContext) -> Result<(), CommandError> {
    ctx.enforce_legal = true;
    Ok(())
}

// Filled in by the host at the end of playback, see `update_metadata`.
fn no_op(_ctx: &mut PlaybackContext) -> Result<(), CommandError> {
    Ok(())
}

fn console(ctx: &mut PlaybackContext, args: &[String]) -> Result<(), CommandError> {
    if args.first().is_none_or(|arg| arg.is_empty()) {
        return Err(CommandError::MissingArgument {
            command: "Console",
            name: "command",
        });
    }
    ctx.queue_host_command(HostCommand {
        kind: HostCommandKind::Console,
        args: args.to_vec(),
    });
    Ok(())
}

fn set(ctx: &mut PlaybackContext, args: &[String]) -> Result<(), CommandError> {
    match args {
        [] => Err(CommandError::MissingArgument {
            command: "Set",
            name: "target",
        }),
        [_] => Err(CommandError::MissingArgument {
            command: "Set",
            name: "value",
        }),
        _ => {
            ctx.queue_host_command(HostCommand {
                kind: HostCommandKind::Set,
                args: args.to_vec(),
            });
            Ok(())
        }
    }
}

fn press(ctx: &mut PlaybackContext, args: &[String]) -> Result<(), CommandError> {
    for key in args.iter().filter(|key| !key.is_empty()) {
        if !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CommandError::InvalidArgument {
                command: "Press",
                value: key.clone(),
                reason: "key names are alphanumeric",
            });
        }
        ctx.press_key(key.to_ascii_uppercase());
    }
    Ok(())
}

fn room_name(
    ctx: &mut PlaybackContext,
    _timeline: &Timeline,
    command: &Command,
) -> Result<(), CommandError> {
    ctx.request_metadata(MetadataRequest::for_command(MetadataKind::RoomName, command));
    Ok(())
}
