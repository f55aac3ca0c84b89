use serde::Serialize;
use std::collections::BTreeSet;

use tasrun_shared::Actions;

use super::InputFrame;

/// Controller state written to the host once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputState {
    pub actions: Actions,
    /// Analog stick, x right and y up, each in [-1, 1].
    pub stick: (f32, f32),
    /// Whether `stick` comes from a feather angle rather than the dpad.
    pub analog: bool,
    /// Extra keys held through `Press`.
    pub pressed_keys: Vec<String>,
}

impl InputState {
    pub fn from_frame(frame: &InputFrame, pressed_keys: &BTreeSet<String>) -> Self {
        let actions = frame.actions();
        let analog = actions.contains(Actions::FEATHER);
        let stick = if analog {
            let radians = frame.angle().to_radians();
            let magnitude = frame.magnitude();
            (radians.sin() * magnitude, radians.cos() * magnitude)
        } else {
            let (x, y) = dpad(actions);
            (f32::from(x), f32::from(y))
        };

        Self {
            actions,
            stick,
            analog,
            pressed_keys: pressed_keys.iter().cloned().collect(),
        }
    }

    /// Neutral input, used when playback has nothing left to feed.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn dpad(&self) -> (i8, i8) {
        dpad(self.actions)
    }
}

/// Opposite directions cancel out.
fn dpad(actions: Actions) -> (i8, i8) {
    let axis = |negative: Actions, positive: Actions| -> i8 {
        i8::from(actions.contains(positive)) - i8::from(actions.contains(negative))
    };
    (
        axis(Actions::LEFT, Actions::RIGHT),
        axis(Actions::DOWN, Actions::UP),
    )
}
