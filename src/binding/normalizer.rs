//! Raw device events to candidate inputs
//!
//! Pure function of the event and the active session. Events that belong to
//! another controller, or that carry no meaning for the acceptance protocols
//! (key repeats, analog values between dead zone and threshold), are dropped.

use crate::binding::candidate::{AxisSign, CandidateInput, HatDirection, KeyCode};
use crate::controller::ControllerId;

/// Discrete input event handed over by the input backend
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawInputEvent {
    KeyDown {
        code: KeyCode,
        repeat: bool,
    },
    KeyUp {
        code: KeyCode,
    },
    JoyButtonDown {
        index: u32,
        controller: ControllerId,
    },
    JoyButtonUp {
        index: u32,
        controller: ControllerId,
    },
    /// `value` in `[-1, 1]`
    JoyAxis {
        value: f32,
        index: u32,
        controller: ControllerId,
    },
    /// `x`, `y` in `{-1, 0, 1}`, `y < 0` is up
    JoyHat {
        x: i8,
        y: i8,
        index: u32,
        controller: ControllerId,
    },
}

impl RawInputEvent {
    /// Controller the event originates from; key events come from the keyboard
    pub fn controller(&self) -> ControllerId {
        match self {
            RawInputEvent::KeyDown { .. } | RawInputEvent::KeyUp { .. } => ControllerId::Keyboard,
            RawInputEvent::JoyButtonDown { controller, .. }
            | RawInputEvent::JoyButtonUp { controller, .. }
            | RawInputEvent::JoyAxis { controller, .. }
            | RawInputEvent::JoyHat { controller, .. } => *controller,
        }
    }
}

/// Where a "back to neutral" reading came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeutralSource {
    Axis(u32),
    Hat(u32),
}

/// Candidate plus the phase it was observed in
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NormalizedInput {
    Pressed(CandidateInput),
    Released(CandidateInput),
    /// Analog axis past the threshold, or hat off-centre
    ThresholdCrossed(CandidateInput),
    ReturnedToNeutral(NeutralSource),
    /// Cancel key while a non-keyboard controller is being configured
    Cancel,
}

/// Session state the normalizer reads
#[derive(Clone, Copy, Debug)]
pub struct NormalizerContext {
    pub active: ControllerId,
    pub dead_zone: f32,
    pub axis_threshold: f32,
    pub cancel_key: KeyCode,
}

pub fn normalize(event: &RawInputEvent, ctx: &NormalizerContext) -> Option<NormalizedInput> {
    match *event {
        RawInputEvent::KeyDown { code, repeat } => {
            if repeat {
                return None;
            }
            if ctx.active.is_keyboard() {
                Some(NormalizedInput::Pressed(CandidateInput::Key { code }))
            } else if code == ctx.cancel_key {
                Some(NormalizedInput::Cancel)
            } else {
                None
            }
        }
        RawInputEvent::KeyUp { code } => ctx
            .active
            .is_keyboard()
            .then_some(NormalizedInput::Released(CandidateInput::Key { code })),
        RawInputEvent::JoyButtonDown { index, controller } => (controller == ctx.active)
            .then_some(NormalizedInput::Pressed(CandidateInput::JoyButton { index })),
        RawInputEvent::JoyButtonUp { index, controller } => (controller == ctx.active)
            .then_some(NormalizedInput::Released(CandidateInput::JoyButton { index })),
        RawInputEvent::JoyAxis {
            value,
            index,
            controller,
        } => {
            if controller != ctx.active {
                return None;
            }
            let magnitude = value.abs();
            if magnitude > ctx.axis_threshold {
                Some(NormalizedInput::ThresholdCrossed(CandidateInput::JoyAxis {
                    index,
                    direction: AxisSign::of(value),
                }))
            } else if magnitude <= ctx.dead_zone {
                Some(NormalizedInput::ReturnedToNeutral(NeutralSource::Axis(index)))
            } else {
                None
            }
        }
        RawInputEvent::JoyHat {
            x,
            y,
            index,
            controller,
        } => {
            if controller != ctx.active {
                return None;
            }
            match HatDirection::from_xy(x, y) {
                Some(direction) => Some(NormalizedInput::ThresholdCrossed(CandidateInput::JoyHat {
                    index,
                    axis: direction.axis(),
                    value: direction,
                })),
                None => Some(NormalizedInput::ReturnedToNeutral(NeutralSource::Hat(index))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::candidate::HatAxis;

    const PAD: ControllerId = ControllerId::Gamepad(0);
    const OTHER_PAD: ControllerId = ControllerId::Gamepad(1);

    fn gamepad_ctx() -> NormalizerContext {
        NormalizerContext {
            active: PAD,
            dead_zone: 0.2,
            axis_threshold: 0.75,
            cancel_key: KeyCode::ESCAPE,
        }
    }

    fn keyboard_ctx() -> NormalizerContext {
        NormalizerContext {
            active: ControllerId::Keyboard,
            ..gamepad_ctx()
        }
    }

    #[test]
    fn test_joy_button_edges() {
        let ctx = gamepad_ctx();
        let down = RawInputEvent::JoyButtonDown {
            index: 3,
            controller: PAD,
        };
        let up = RawInputEvent::JoyButtonUp {
            index: 3,
            controller: PAD,
        };
        assert_eq!(
            normalize(&down, &ctx),
            Some(NormalizedInput::Pressed(CandidateInput::JoyButton { index: 3 }))
        );
        assert_eq!(
            normalize(&up, &ctx),
            Some(NormalizedInput::Released(CandidateInput::JoyButton { index: 3 }))
        );
    }

    #[test]
    fn test_other_controller_is_ignored() {
        let ctx = gamepad_ctx();
        let down = RawInputEvent::JoyButtonDown {
            index: 3,
            controller: OTHER_PAD,
        };
        let axis = RawInputEvent::JoyAxis {
            value: 1.0,
            index: 0,
            controller: OTHER_PAD,
        };
        assert_eq!(normalize(&down, &ctx), None);
        assert_eq!(normalize(&axis, &ctx), None);
    }

    #[test]
    fn test_axis_threshold_and_dead_zone() {
        let ctx = gamepad_ctx();
        let axis = |value| RawInputEvent::JoyAxis {
            value,
            index: 1,
            controller: PAD,
        };

        assert_eq!(
            normalize(&axis(-0.9), &ctx),
            Some(NormalizedInput::ThresholdCrossed(CandidateInput::JoyAxis {
                index: 1,
                direction: AxisSign::Negative,
            }))
        );
        // Between dead zone and threshold: no information
        assert_eq!(normalize(&axis(0.5), &ctx), None);
        assert_eq!(normalize(&axis(0.75), &ctx), None);
        assert_eq!(
            normalize(&axis(0.2), &ctx),
            Some(NormalizedInput::ReturnedToNeutral(NeutralSource::Axis(1)))
        );
        assert_eq!(
            normalize(&axis(0.0), &ctx),
            Some(NormalizedInput::ReturnedToNeutral(NeutralSource::Axis(1)))
        );
    }

    #[test]
    fn test_hat_direction_and_neutral() {
        let ctx = gamepad_ctx();
        let hat = |x, y| RawInputEvent::JoyHat {
            x,
            y,
            index: 0,
            controller: PAD,
        };
        assert_eq!(
            normalize(&hat(1, 0), &ctx),
            Some(NormalizedInput::ThresholdCrossed(CandidateInput::JoyHat {
                index: 0,
                axis: HatAxis::X,
                value: HatDirection::Right,
            }))
        );
        assert_eq!(
            normalize(&hat(0, 0), &ctx),
            Some(NormalizedInput::ReturnedToNeutral(NeutralSource::Hat(0)))
        );
    }

    #[test]
    fn test_keys_on_keyboard_session() {
        let ctx = keyboard_ctx();
        let down = RawInputEvent::KeyDown {
            code: KeyCode(65),
            repeat: false,
        };
        let repeat = RawInputEvent::KeyDown {
            code: KeyCode(65),
            repeat: true,
        };
        let up = RawInputEvent::KeyUp { code: KeyCode(65) };

        assert_eq!(
            normalize(&down, &ctx),
            Some(NormalizedInput::Pressed(CandidateInput::Key { code: KeyCode(65) }))
        );
        assert_eq!(normalize(&repeat, &ctx), None);
        assert_eq!(
            normalize(&up, &ctx),
            Some(NormalizedInput::Released(CandidateInput::Key { code: KeyCode(65) }))
        );
    }

    #[test]
    fn test_cancel_key_on_gamepad_session() {
        let ctx = gamepad_ctx();
        let escape = RawInputEvent::KeyDown {
            code: KeyCode::ESCAPE,
            repeat: false,
        };
        let other = RawInputEvent::KeyDown {
            code: KeyCode(65),
            repeat: false,
        };
        assert_eq!(normalize(&escape, &ctx), Some(NormalizedInput::Cancel));
        assert_eq!(normalize(&other, &ctx), None);
        assert_eq!(normalize(&RawInputEvent::KeyUp { code: KeyCode::ESCAPE }, &ctx), None);
    }

    #[test]
    fn test_escape_is_a_plain_key_for_keyboard_session() {
        let ctx = keyboard_ctx();
        let escape = RawInputEvent::KeyDown {
            code: KeyCode::ESCAPE,
            repeat: false,
        };
        assert_eq!(
            normalize(&escape, &ctx),
            Some(NormalizedInput::Pressed(CandidateInput::Key {
                code: KeyCode::ESCAPE
            }))
        );
    }

    #[test]
    fn test_event_controller() {
        assert_eq!(
            RawInputEvent::KeyUp { code: KeyCode(1) }.controller(),
            ControllerId::Keyboard
        );
        assert_eq!(
            RawInputEvent::JoyHat {
                x: 0,
                y: 0,
                index: 0,
                controller: OTHER_PAD
            }
            .controller(),
            OTHER_PAD
        );
    }
}
