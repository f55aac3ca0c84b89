//! Controller actions and their one-letter script codes.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Buttons held during one input frame.
    ///
    /// Bit positions are part of the host contract and must not be reordered.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Actions: u16 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;
        const JUMP = 1 << 4;
        const DASH = 1 << 5;
        const GRAB = 1 << 6;
        const START = 1 << 7;
        const RESTART = 1 << 8;
        /// Analog input; angle and magnitude live on the action line.
        const FEATHER = 1 << 9;
        const JOURNAL = 1 << 10;
        const JUMP2 = 1 << 11;
        const DASH2 = 1 << 12;
        const CONFIRM = 1 << 13;
        const DEMO_DASH = 1 << 14;
        const DEMO_DASH2 = 1 << 15;
    }
}

/// Canonical token order. Feather is written last by the line formatter
/// because it carries its own arguments.
const TOKEN_ORDER: [(Actions, char); 15] = [
    (Actions::LEFT, 'L'),
    (Actions::RIGHT, 'R'),
    (Actions::UP, 'U'),
    (Actions::DOWN, 'D'),
    (Actions::JUMP, 'J'),
    (Actions::JUMP2, 'K'),
    (Actions::DASH, 'X'),
    (Actions::DASH2, 'C'),
    (Actions::DEMO_DASH, 'Z'),
    (Actions::DEMO_DASH2, 'V'),
    (Actions::GRAB, 'G'),
    (Actions::START, 'S'),
    (Actions::RESTART, 'Q'),
    (Actions::JOURNAL, 'N'),
    (Actions::CONFIRM, 'O'),
];

impl Actions {
    /// Look up the action for a script letter. Case-insensitive.
    pub fn from_char(c: char) -> Option<Actions> {
        match c.to_ascii_uppercase() {
            'L' => Some(Actions::LEFT),
            'R' => Some(Actions::RIGHT),
            'U' => Some(Actions::UP),
            'D' => Some(Actions::DOWN),
            'J' => Some(Actions::JUMP),
            'K' => Some(Actions::JUMP2),
            'X' => Some(Actions::DASH),
            'C' => Some(Actions::DASH2),
            'Z' => Some(Actions::DEMO_DASH),
            'V' => Some(Actions::DEMO_DASH2),
            'G' => Some(Actions::GRAB),
            'S' => Some(Actions::START),
            'Q' => Some(Actions::RESTART),
            'N' => Some(Actions::JOURNAL),
            'O' => Some(Actions::CONFIRM),
            'F' => Some(Actions::FEATHER),
            _ => None,
        }
    }

    /// Letters of the held actions in canonical order, feather excluded.
    pub fn letters(self) -> impl Iterator<Item = char> {
        TOKEN_ORDER
            .into_iter()
            .filter(move |(action, _)| self.contains(*action))
            .map(|(_, c)| c)
    }

    /// Flip `other` in place. Repeating a letter on one line cancels it out.
    pub fn toggle_action(&mut self, other: Actions) {
        *self ^= other;
    }

    pub fn has_direction(self) -> bool {
        self.intersects(Actions::LEFT | Actions::RIGHT | Actions::UP | Actions::DOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions_are_stable() {
        assert_eq!(Actions::LEFT.bits(), 1);
        assert_eq!(Actions::FEATHER.bits(), 1 << 9);
        assert_eq!(Actions::CONFIRM.bits(), 1 << 13);
        assert_eq!(Actions::DEMO_DASH2.bits(), 1 << 15);
    }

    #[test]
    fn test_from_char_is_case_insensitive() {
        assert_eq!(Actions::from_char('j'), Some(Actions::JUMP));
        assert_eq!(Actions::from_char('J'), Some(Actions::JUMP));
        assert_eq!(Actions::from_char('z'), Some(Actions::DEMO_DASH));
        assert_eq!(Actions::from_char('1'), None);
        assert_eq!(Actions::from_char(','), None);
    }

    #[test]
    fn test_letters_follow_canonical_order() {
        let actions = Actions::GRAB | Actions::LEFT | Actions::DASH | Actions::JUMP;
        let letters: String = actions.letters().collect();
        assert_eq!(letters, "LJXG");
    }

    #[test]
    fn test_toggle_cancels() {
        let mut actions = Actions::empty();
        actions.toggle_action(Actions::LEFT);
        actions.toggle_action(Actions::LEFT);
        assert!(actions.is_empty());
        assert!(!actions.has_direction());
    }
}
