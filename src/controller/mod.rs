//! Controller subsystem: the devices being configured
//!
//! 1. [`Controller`] - What the configurator needs from a device
//! 2. [`profile`] - Production controller backed by a persisted binding table
//! 3. [`event_collector`] - gilrs polling that feeds the configurator
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Collector ──► ConfiguratorCommand ──► Configurator ──► Controller::bind / save
//!             (gilrs)        (Input, Connected,                       (ControllerProfile)
//!                             Disconnected)
//! ```

pub mod event_collector;
pub mod profile;

use crate::binding::candidate::CandidateInput;
use crate::binding::entry::AxisDirection;
use crate::persistence::PersistenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use event_collector::{CollectorError, CollectorHandle, CollectorSettings};
pub use profile::ControllerProfile;

/// Identity of a connected input device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerId {
    /// The keyboard, treated as one controller
    Keyboard,
    /// Gamepad slot as reported by the backend
    Gamepad(usize),
}

impl ControllerId {
    pub fn is_keyboard(&self) -> bool {
        matches!(self, ControllerId::Keyboard)
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerId::Keyboard => write!(f, "keyboard"),
            ControllerId::Gamepad(slot) => write!(f, "gamepad {}", slot),
        }
    }
}

/// Axis action id together with the logical direction, e.g. `-move` / `+move`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignedAction {
    pub id: String,
    pub sign: AxisDirection,
}

impl SignedAction {
    pub fn new(id: impl Into<String>, sign: AxisDirection) -> Self {
        Self {
            id: id.into(),
            sign,
        }
    }
}

impl fmt::Display for SignedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sign.symbol(), self.id)
    }
}

/// A device as seen by the configurator.
///
/// Implementations are created and destroyed by the input backend; the
/// configurator only holds them while they are queued, configured or known.
pub trait Controller {
    fn id(&self) -> ControllerId;

    fn name(&self) -> &str;

    /// Axis magnitude at or below which a reading counts as neutral
    fn dead_zone(&self) -> f32;

    fn is_configured(&self) -> bool;

    /// Drops all bindings. With `clear_persisted` the stored table and the
    /// configured flag are cleared as well.
    fn reset(&mut self, clear_persisted: bool);

    fn bind(&mut self, action_id: &str, input: CandidateInput);

    fn bind_axis(&mut self, action: SignedAction, input: CandidateInput);

    /// Persists the current bindings and marks the controller configured
    fn save(&mut self) -> Result<(), PersistenceError>;
}
