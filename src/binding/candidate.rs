//! Normalized, comparable representation of "this physical input was activated"

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host key code, passed through untouched from the keyboard backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ESCAPE: KeyCode = KeyCode(27);
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sign of an analog deflection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisSign {
    Negative,
    Positive,
}

impl AxisSign {
    pub fn of(value: f32) -> Self {
        if value < 0.0 {
            AxisSign::Negative
        } else {
            AxisSign::Positive
        }
    }
}

/// Which of the two hat dimensions moved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatAxis {
    X,
    Y,
}

/// Discrete hat direction. Neutral is not a direction; see [`HatDirection::from_xy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatDirection {
    Up,
    Right,
    Down,
    Left,
}

impl HatDirection {
    /// Resolves a raw hat reading by priority: vertical first, then horizontal.
    ///
    /// `y < 0` is up. Returns `None` for the centred (neutral) hat.
    pub fn from_xy(x: i8, y: i8) -> Option<Self> {
        if y < 0 {
            Some(HatDirection::Up)
        } else if y > 0 {
            Some(HatDirection::Down)
        } else if x > 0 {
            Some(HatDirection::Right)
        } else if x < 0 {
            Some(HatDirection::Left)
        } else {
            None
        }
    }

    pub fn axis(self) -> HatAxis {
        match self {
            HatDirection::Up | HatDirection::Down => HatAxis::Y,
            HatDirection::Right | HatDirection::Left => HatAxis::X,
        }
    }
}

/// The device kind that produced a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Key,
    JoyButton,
    JoyAxis,
    JoyHat,
}

/// A physical input proposed for the entry currently being configured
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CandidateInput {
    Key {
        code: KeyCode,
    },
    JoyButton {
        index: u32,
    },
    /// `direction` is the sign measured when the threshold was crossed
    JoyAxis {
        index: u32,
        direction: AxisSign,
    },
    JoyHat {
        index: u32,
        axis: HatAxis,
        value: HatDirection,
    },
}

impl CandidateInput {
    pub fn kind(&self) -> DeviceKind {
        match self {
            CandidateInput::Key { .. } => DeviceKind::Key,
            CandidateInput::JoyButton { .. } => DeviceKind::JoyButton,
            CandidateInput::JoyAxis { .. } => DeviceKind::JoyAxis,
            CandidateInput::JoyHat { .. } => DeviceKind::JoyHat,
        }
    }

    /// Keys and joystick buttons: edge-triggered, no analog range
    pub fn is_discrete(&self) -> bool {
        matches!(self.kind(), DeviceKind::Key | DeviceKind::JoyButton)
    }

    /// Equality used for "already in use" checks.
    ///
    /// Identical to `==` except for hats, where one hat axis is occupied as a
    /// whole regardless of the value that was pressed.
    pub fn occupies_same_input(&self, other: &CandidateInput) -> bool {
        match (self, other) {
            (
                CandidateInput::JoyHat {
                    index: a, axis: ax, ..
                },
                CandidateInput::JoyHat {
                    index: b, axis: bx, ..
                },
            ) => a == b && ax == bx,
            _ => self == other,
        }
    }
}

impl fmt::Display for CandidateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateInput::Key { code } => write!(f, "Key {}", code),
            CandidateInput::JoyButton { index } => write!(f, "Button {}", index),
            CandidateInput::JoyAxis { index, direction } => match direction {
                AxisSign::Negative => write!(f, "Axis {}-", index),
                AxisSign::Positive => write!(f, "Axis {}+", index),
            },
            CandidateInput::JoyHat { index, value, .. } => {
                write!(f, "Hat {} {:?}", index, value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hat_direction_priority() {
        assert_eq!(HatDirection::from_xy(0, -1), Some(HatDirection::Up));
        assert_eq!(HatDirection::from_xy(0, 1), Some(HatDirection::Down));
        assert_eq!(HatDirection::from_xy(1, 0), Some(HatDirection::Right));
        assert_eq!(HatDirection::from_xy(-1, 0), Some(HatDirection::Left));
        assert_eq!(HatDirection::from_xy(0, 0), None);

        // Diagonals resolve to the vertical component
        assert_eq!(HatDirection::from_xy(1, -1), Some(HatDirection::Up));
        assert_eq!(HatDirection::from_xy(-1, 1), Some(HatDirection::Down));
    }

    #[test]
    fn test_hat_direction_axis() {
        assert_eq!(HatDirection::Down.axis(), HatAxis::Y);
        assert_eq!(HatDirection::Up.axis(), HatAxis::Y);
        assert_eq!(HatDirection::Left.axis(), HatAxis::X);
    }

    #[test]
    fn test_hat_occupies_whole_axis() {
        let up = CandidateInput::JoyHat {
            index: 0,
            axis: HatAxis::Y,
            value: HatDirection::Up,
        };
        let down = CandidateInput::JoyHat {
            index: 0,
            axis: HatAxis::Y,
            value: HatDirection::Down,
        };
        let right = CandidateInput::JoyHat {
            index: 0,
            axis: HatAxis::X,
            value: HatDirection::Right,
        };
        let other_hat = CandidateInput::JoyHat {
            index: 1,
            axis: HatAxis::Y,
            value: HatDirection::Up,
        };

        assert_ne!(up, down);
        assert!(up.occupies_same_input(&down));
        assert!(!up.occupies_same_input(&right));
        assert!(!up.occupies_same_input(&other_hat));
    }

    #[test]
    fn test_axis_direction_is_discriminating() {
        let plus = CandidateInput::JoyAxis {
            index: 0,
            direction: AxisSign::Positive,
        };
        let minus = CandidateInput::JoyAxis {
            index: 0,
            direction: AxisSign::Negative,
        };
        assert!(!plus.occupies_same_input(&minus));
        assert!(plus.occupies_same_input(&plus));
    }

    #[test]
    fn test_kind_mismatch_never_equal() {
        let key = CandidateInput::Key { code: KeyCode(3) };
        let button = CandidateInput::JoyButton { index: 3 };
        assert!(!key.occupies_same_input(&button));
        assert!(key.is_discrete());
        assert!(button.is_discrete());
        assert!(!CandidateInput::JoyAxis {
            index: 3,
            direction: AxisSign::Positive
        }
        .is_discrete());
    }

    #[test]
    fn test_axis_sign_of_value() {
        assert_eq!(AxisSign::of(0.9), AxisSign::Positive);
        assert_eq!(AxisSign::of(-0.9), AxisSign::Negative);
        assert_eq!(AxisSign::of(0.0), AxisSign::Positive);
    }
}
