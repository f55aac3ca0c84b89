//! `<frames>(,<token>)*` input lines.

use std::fmt;

use crate::MAX_FRAMES;
use crate::actions::Actions;

/// One parsed input line.
///
/// Every letter of every token toggles its action. The feather token `F`
/// additionally consumes up to two following numeric tokens as angle and
/// magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionLine {
    pub frames: u32,
    pub actions: Actions,
    pub feather_angle: Option<f32>,
    pub feather_magnitude: Option<f32>,
}

impl ActionLine {
    /// Parse a line, clamping the duration to [`MAX_FRAMES`].
    ///
    /// Returns `None` when the leading token is not an unsigned integer.
    pub fn parse(line: &str) -> Option<Self> {
        Self::parse_with_limit(line, MAX_FRAMES)
    }

    pub fn parse_with_limit(line: &str, max_frames: u32) -> Option<Self> {
        let mut tokens = line.trim().split(',').map(str::trim);

        let frames_token = tokens.next()?;
        if frames_token.is_empty() || !frames_token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Overlong digit runs still clamp rather than fail.
        let frames = frames_token
            .parse::<u64>()
            .map(|f| f.min(max_frames as u64) as u32)
            .unwrap_or(max_frames);

        let mut result = ActionLine {
            frames,
            actions: Actions::empty(),
            feather_angle: None,
            feather_magnitude: None,
        };

        let tokens: Vec<&str> = tokens.collect();
        let mut i = 0;
        while i < tokens.len() {
            let mut feather = false;
            for c in tokens[i].chars() {
                if let Some(action) = Actions::from_char(c) {
                    result.actions.toggle_action(action);
                    if action == Actions::FEATHER {
                        feather = true;
                        break;
                    }
                }
            }
            i += 1;

            if feather {
                // Angle and magnitude are optional; other tokens stay actions
                if let Some(angle) = tokens.get(i).and_then(|token| parse_float(token)) {
                    result.feather_angle = angle.map(|value| value.clamp(0.0, 360.0));
                    i += 1;

                    if let Some(token) = tokens.get(i) {
                        if token.is_empty() {
                            i += 1;
                        } else if let Some(magnitude) = parse_float(token) {
                            result.feather_magnitude = magnitude.map(|value| value.clamp(0.0, 1.0));
                            i += 1;
                        }
                    }
                }
            }
        }

        Some(result)
    }

    pub fn angle(&self) -> f32 {
        self.feather_angle.unwrap_or(0.0)
    }

    pub fn magnitude(&self) -> f32 {
        self.feather_magnitude.unwrap_or(1.0)
    }

    /// Canonical action tokens without the duration, e.g. `R,X,F,90`.
    ///
    /// Two lines holding the same buttons format identically no matter how
    /// their letters were spelled in the script.
    pub fn action_tokens(&self) -> String {
        let mut out = String::new();
        for c in self.actions.letters() {
            if !out.is_empty() {
                out.push(',');
            }
            out.push(c);
        }
        if self.actions.contains(Actions::FEATHER) {
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str("F,");
            if let Some(angle) = self.feather_angle {
                out.push_str(&angle.to_string());
            }
            if let Some(magnitude) = self.feather_magnitude {
                out.push(',');
                out.push_str(&magnitude.to_string());
            }
        }
        out
    }
}

/// `Some(None)` for a float literal that is not finite, such as `NaN`.
fn parse_float(token: &str) -> Option<Option<f32>> {
    token
        .parse::<f32>()
        .ok()
        .map(|value| value.is_finite().then_some(value))
}

impl fmt::Display for ActionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self.action_tokens();
        if tokens.is_empty() {
            write!(f, "{}", self.frames)
        } else {
            write!(f, "{},{}", self.frames, tokens)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let line = ActionLine::parse("10,R,J").unwrap();
        assert_eq!(line.frames, 10);
        assert_eq!(line.actions, Actions::RIGHT | Actions::JUMP);
        assert_eq!(line.feather_angle, None);
    }

    #[test]
    fn test_parse_frames_only() {
        let line = ActionLine::parse("  42 ").unwrap();
        assert_eq!(line.frames, 42);
        assert!(line.actions.is_empty());
    }

    #[test]
    fn test_duplicate_letter_cancels() {
        let line = ActionLine::parse("5,L,L").unwrap();
        assert!(!line.actions.has_direction());

        let line = ActionLine::parse("5,LRL").unwrap();
        assert_eq!(line.actions, Actions::RIGHT);
    }

    #[test]
    fn test_lowercase_letters_toggle() {
        let line = ActionLine::parse("3,r,j").unwrap();
        assert_eq!(line.actions, Actions::RIGHT | Actions::JUMP);
    }

    #[test]
    fn test_duration_clamped() {
        let line = ActionLine::parse("123456,R").unwrap();
        assert_eq!(line.frames, MAX_FRAMES);

        let line = ActionLine::parse("99999999999999999999999").unwrap();
        assert_eq!(line.frames, MAX_FRAMES);
    }

    #[test]
    fn test_rejects_non_numeric_lead() {
        assert!(ActionLine::parse("R,10").is_none());
        assert!(ActionLine::parse("-5,R").is_none());
        assert!(ActionLine::parse("").is_none());
        assert!(ActionLine::parse("Read, file").is_none());
    }

    #[test]
    fn test_feather_consumes_angle_and_magnitude() {
        let line = ActionLine::parse("1,F,90,0.5,J").unwrap();
        assert_eq!(line.actions, Actions::FEATHER | Actions::JUMP);
        assert_eq!(line.feather_angle, Some(90.0));
        assert_eq!(line.feather_magnitude, Some(0.5));
    }

    #[test]
    fn test_feather_leaves_action_tokens() {
        let line = ActionLine::parse("1,F,J").unwrap();
        assert_eq!(line.actions, Actions::FEATHER | Actions::JUMP);
        assert_eq!(line.feather_angle, None);
        assert_eq!(line.feather_magnitude, None);
        assert_eq!(line.to_string(), "1,J,F,");

        let line = ActionLine::parse("1,F,90,J").unwrap();
        assert_eq!(line.actions, Actions::FEATHER | Actions::JUMP);
        assert_eq!(line.feather_angle, Some(90.0));
        assert_eq!(line.feather_magnitude, None);
        assert_eq!(line.to_string(), "1,J,F,90");

        let line = ActionLine::parse("1,F,90,0.5,J").unwrap();
        assert_eq!(line.to_string(), "1,J,F,90,0.5");
        assert_eq!(ActionLine::parse(&line.to_string()), Some(line));
    }

    #[test]
    fn test_feather_empty_magnitude_is_skipped() {
        let line = ActionLine::parse("1,F,45,,J").unwrap();
        assert_eq!(line.actions, Actions::FEATHER | Actions::JUMP);
        assert_eq!(line.feather_angle, Some(45.0));
        assert_eq!(line.feather_magnitude, None);
    }

    #[test]
    fn test_feather_rejects_non_finite_values() {
        let line = ActionLine::parse("1,F,NaN,inf").unwrap();
        assert_eq!(line.actions, Actions::FEATHER);
        assert_eq!(line.feather_angle, None);
        assert_eq!(line.feather_magnitude, None);
        assert_eq!(line.angle(), 0.0);
        assert_eq!(line.magnitude(), 1.0);
    }

    #[test]
    fn test_feather_values_clamped() {
        let line = ActionLine::parse("1,F,400,3").unwrap();
        assert_eq!(line.feather_angle, Some(360.0));
        assert_eq!(line.feather_magnitude, Some(1.0));
    }

    #[test]
    fn test_feather_defaults() {
        let line = ActionLine::parse("1,F").unwrap();
        assert_eq!(line.angle(), 0.0);
        assert_eq!(line.magnitude(), 1.0);

        let line = ActionLine::parse("1,F,,").unwrap();
        assert_eq!(line.feather_angle, None);
        assert_eq!(line.feather_magnitude, None);
    }

    #[test]
    fn test_canonical_display() {
        let line = ActionLine::parse("20,X,r").unwrap();
        assert_eq!(line.to_string(), "20,R,X");
        assert_eq!(line.action_tokens(), "R,X");

        let line = ActionLine::parse("7").unwrap();
        assert_eq!(line.to_string(), "7");
        assert_eq!(line.action_tokens(), "");

        let line = ActionLine::parse("2,J,F,45").unwrap();
        assert_eq!(line.to_string(), "2,J,F,45");
    }
}
