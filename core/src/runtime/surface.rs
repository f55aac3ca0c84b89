//! The narrow interface between playback and the host simulation.

use crate::command::{CommandError, HostCommand, MetadataKind};
use crate::input::InputState;
use crate::script::ScriptError;

/// What the driver needs from the host, once per simulation tick.
///
/// Only [`InputSurface::apply_input`] is mandatory; hosts without loading
/// screens, consoles or timers can rely on the defaults.
pub trait InputSurface {
    /// Hold `state` for the upcoming simulation step.
    fn apply_input(&mut self, state: &InputState);

    /// True while the host is mid-load and the tick must be skipped.
    fn is_loading(&self) -> bool {
        false
    }

    /// Run a `Console`/`Set` directive.
    fn execute_host_command(&mut self, command: &HostCommand) -> Result<(), CommandError> {
        log::debug!("Ignoring host command: {}", command);
        Ok(())
    }

    /// Current value of a metadata field, e.g. the file time as `0:49.385`.
    fn metadata(&mut self, _kind: MetadataKind) -> Option<String> {
        None
    }

    /// Every re-parse attempt failed; the previous timeline stays active.
    fn on_reload_failed(&mut self, _error: &ScriptError) {}
}
