//! Per-device acceptance protocols
//!
//! Each device kind has its own notion of "the user meant this input":
//!
//! - **Key / JoyButton** (edge-triggered): press holds the candidate, release
//!   of the same candidate accepts it. A different press of the same kind
//!   while one is held aborts the session.
//! - **JoyAxis** (threshold + hysteresis): crossing the threshold arms the
//!   candidate, falling back into the dead zone on the same axis accepts it.
//!   The recorded sign is the one measured at threshold time.
//! - **JoyHat** (direction + neutral): leaving centre arms the candidate,
//!   returning to centre on the same hat accepts it.
//!
//! All of them pass through the same admission check (conflicts and the
//! axis-kind rule) before any state changes.

use crate::binding::candidate::{CandidateInput, DeviceKind};
use crate::binding::conflict::check_in_use;
use crate::binding::entry::{AxisDirection, EntrySet};
use crate::binding::error::BindingError;
use crate::binding::normalizer::{NeutralSource, NormalizedInput};
use crate::binding::sequencer::Position;
use tracing::debug;

/// Why a session ended early through input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// A second, different press of the same kind while one was held
    SecondPress {
        held: CandidateInput,
        pressed: CandidateInput,
    },
    /// Cancel key while configuring a non-keyboard controller
    CancelKey,
    /// Host asked for it
    Requested,
}

/// Result of feeding one normalized input to the protocols
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ignored,
    Rejected(BindingError),
    /// Key/button held; the skip watchdog should run
    Pending(CandidateInput),
    /// Axis/hat armed, waiting for neutral
    Waiting(CandidateInput),
    Accepted(CandidateInput),
    Abort(AbortReason),
}

/// What the protocols may look at besides their own state
#[derive(Clone, Copy, Debug)]
pub struct ProtocolContext<'a> {
    pub entries: &'a EntrySet,
    pub position: Position,
}

/// In-flight candidate of the active session
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcceptanceState {
    pending_press: Option<CandidateInput>,
    waiting_release: Option<CandidateInput>,
}

impl AcceptanceState {
    pub fn handle(&mut self, input: NormalizedInput, ctx: &ProtocolContext<'_>) -> Outcome {
        if ctx.position == Position::Complete {
            return Outcome::Ignored;
        }

        match input {
            NormalizedInput::Cancel => Outcome::Abort(AbortReason::CancelKey),
            NormalizedInput::Pressed(candidate) => self.press(candidate, ctx),
            NormalizedInput::Released(candidate) => self.release(candidate),
            NormalizedInput::ThresholdCrossed(candidate) => match candidate.kind() {
                DeviceKind::JoyAxis | DeviceKind::JoyHat => self.arm(candidate, ctx),
                DeviceKind::Key | DeviceKind::JoyButton => Outcome::Ignored,
            },
            NormalizedInput::ReturnedToNeutral(source) => self.neutral(source),
        }
    }

    pub fn pending_press(&self) -> Option<CandidateInput> {
        self.pending_press
    }

    pub fn waiting_release(&self) -> Option<CandidateInput> {
        self.waiting_release
    }

    pub fn is_idle(&self) -> bool {
        self.pending_press.is_none() && self.waiting_release.is_none()
    }

    /// Drops the held key/button, used when the entry is skipped
    pub fn clear_pending(&mut self) -> Option<CandidateInput> {
        self.pending_press.take()
    }

    fn press(&mut self, candidate: CandidateInput, ctx: &ProtocolContext<'_>) -> Outcome {
        if let Some(waiting) = self.waiting_release {
            debug!("Ignoring {} while {} returns to neutral", candidate, waiting);
            return Outcome::Ignored;
        }

        if let Some(held) = self.pending_press {
            if held == candidate {
                return Outcome::Ignored;
            }
            if held.kind() == candidate.kind() {
                return Outcome::Abort(AbortReason::SecondPress {
                    held,
                    pressed: candidate,
                });
            }
            debug!("Ignoring {} while {} is held", candidate, held);
            return Outcome::Ignored;
        }

        if let Err(e) = admit(&candidate, ctx) {
            return Outcome::Rejected(e);
        }

        self.pending_press = Some(candidate);
        Outcome::Pending(candidate)
    }

    fn release(&mut self, candidate: CandidateInput) -> Outcome {
        if self.pending_press == Some(candidate) {
            self.pending_press = None;
            Outcome::Accepted(candidate)
        } else {
            Outcome::Ignored
        }
    }

    fn arm(&mut self, candidate: CandidateInput, ctx: &ProtocolContext<'_>) -> Outcome {
        // First crossing wins until the input is back at neutral
        if self.pending_press.is_some() || self.waiting_release.is_some() {
            return Outcome::Ignored;
        }

        if let Err(e) = admit(&candidate, ctx) {
            return Outcome::Rejected(e);
        }

        self.waiting_release = Some(candidate);
        Outcome::Waiting(candidate)
    }

    fn neutral(&mut self, source: NeutralSource) -> Outcome {
        let matches = match (source, self.waiting_release) {
            (NeutralSource::Axis(index), Some(CandidateInput::JoyAxis { index: armed, .. })) => {
                index == armed
            }
            (NeutralSource::Hat(index), Some(CandidateInput::JoyHat { index: armed, .. })) => {
                index == armed
            }
            _ => false,
        };

        if !matches {
            return Outcome::Ignored;
        }
        match self.waiting_release.take() {
            Some(candidate) => Outcome::Accepted(candidate),
            None => Outcome::Ignored,
        }
    }
}

/// Checks run before a candidate may become pending or waiting
fn admit(candidate: &CandidateInput, ctx: &ProtocolContext<'_>) -> Result<(), BindingError> {
    if !candidate.is_discrete() {
        if let Position::Axis {
            index,
            direction: AxisDirection::Plus,
        } = ctx.position
        {
            if let Some(entry) = ctx.entries.axes.get(index) {
                if entry.accepted0.is_some_and(|first| first.is_discrete()) {
                    return Err(BindingError::AsymmetricAxisKind {
                        description: entry.description.clone(),
                        minus_label: entry.minus_label.clone(),
                        plus_label: entry.plus_label.clone(),
                    });
                }
            }
        }
    }

    if let Some(owner) = check_in_use(candidate, &ctx.entries.buttons, &ctx.entries.axes) {
        return Err(BindingError::Conflict {
            description: owner.to_string(),
        });
    }

    Ok(())
}
