//! Binding configurator: turns "press something for Accept" into stored bindings
//!
//! 1. [`normalizer`] - Raw device events to candidate inputs
//! 2. [`protocol`] - Per-device acceptance (press/release, threshold/neutral)
//! 3. [`sequencer`] - Which entry is being configured
//! 4. [`service`] - Sessions, queue, commit
//! 5. [`handle`] - Async driver owning the service
//!
//! # Architecture
//!
//! ```text
//! RawInputEvent ──► normalize ──► AcceptanceState ──► Outcome
//!                                     │                 │
//!                              check_in_use        EntrySet / EntrySequencer
//!                                                       │
//!                                   complete ──► Controller::bind, save
//!                                                       │
//!                                                  Notification
//! ```

pub mod candidate;
pub mod conflict;
pub mod entry;
pub mod error;
pub mod handle;
pub mod normalizer;
pub mod notification;
pub mod protocol;
pub mod queue;
pub mod sequencer;
pub mod service;
pub mod watchdog;


pub use candidate::{AxisSign, CandidateInput, HatAxis, HatDirection, KeyCode};
pub use entry::{AxisDirection, AxisEntry, ButtonEntry, Section};
pub use error::{BindingError, ConfiguratorError};
pub use handle::{ConfiguratorCommand, ConfiguratorHandle};
pub use normalizer::RawInputEvent;
pub use notification::Notification;
pub use sequencer::Position;
pub use service::{ConfiguratorService, ConfiguratorSettings};
