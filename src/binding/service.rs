//! The configurator state machine
//!
//! Owns the entry list, the sequencer, the controller queue and the single
//! active session. Everything is synchronous: callers hand in one event at a
//! time and read the outcome from the notification channel.
//!
//! ```text
//!              controller_connected
//!   Idle ────────────────────────────► Configuring(controller)
//!    ▲                                   │  handle_input / poll_watchdog
//!    │  queue empty                      │
//!    └───────────────────────────────────┤ complete ─► commit, Ready
//!                                        │ abort ────► Aborted
//!                                        │ disconnect
//!                                        ▼
//!                              next queued controller
//! ```

use crate::binding::candidate::KeyCode;
use crate::binding::entry::{AxisDirection, AxisEntry, ButtonEntry, EntrySet};
use crate::binding::normalizer::{normalize, NormalizerContext, RawInputEvent};
use crate::binding::notification::Notification;
use crate::binding::protocol::{AbortReason, AcceptanceState, Outcome, ProtocolContext};
use crate::binding::queue::ControllerQueue;
use crate::binding::sequencer::{EntrySequencer, Position};
use crate::binding::watchdog::SkipWatchdog;
use crate::controller::{Controller, ControllerId, SignedAction};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Tuning of the configurator, supplied by the caller at construction
#[derive(Clone, Debug)]
pub struct ConfiguratorSettings {
    /// Visit all button entries before the axis entries
    pub buttons_first: bool,
    /// Holding a key/button this long skips the entry
    pub hold_to_skip: Duration,
    /// Analog magnitude that arms an axis candidate
    pub axis_threshold: f32,
    /// Aborts a gamepad session from the keyboard
    pub cancel_key: KeyCode,
    /// Delay before a newly connected controller is admitted to the queue
    pub connect_delay: Duration,
}

impl Default for ConfiguratorSettings {
    fn default() -> Self {
        Self {
            buttons_first: true,
            hold_to_skip: Duration::from_secs(2),
            axis_threshold: 0.75,
            cancel_key: KeyCode::ESCAPE,
            connect_delay: Duration::ZERO,
        }
    }
}

struct ActiveSession<C> {
    controller: C,
    acceptance: AcceptanceState,
}

enum SessionEnd {
    Completed,
    Aborted(AbortReason),
    Disconnected,
}

pub struct ConfiguratorService<C: Controller> {
    settings: ConfiguratorSettings,
    entries: EntrySet,
    sequencer: EntrySequencer,
    queue: ControllerQueue<C>,
    active: Option<ActiveSession<C>>,
    /// Controllers that finished (or never needed) a session and are still connected
    known: Vec<C>,
    watchdog: SkipWatchdog,
    notifier: mpsc::Sender<Notification>,
}

impl<C: Controller> ConfiguratorService<C> {
    pub fn new(
        settings: ConfiguratorSettings,
        buttons: Vec<ButtonEntry>,
        axes: Vec<AxisEntry>,
        notifier: mpsc::Sender<Notification>,
    ) -> Self {
        info!(
            "Creating configurator with {} button and {} axis entries (buttons first: {})",
            buttons.len(),
            axes.len(),
            settings.buttons_first
        );
        let sequencer = EntrySequencer::new(settings.buttons_first, buttons.len(), axes.len());
        let watchdog = SkipWatchdog::new(settings.hold_to_skip);

        Self {
            settings,
            entries: EntrySet::new(buttons, axes),
            sequencer,
            queue: ControllerQueue::new(),
            active: None,
            known: Vec::new(),
            watchdog,
            notifier,
        }
    }

    /// Queues an unconfigured controller, starting its session right away if idle
    pub fn controller_connected(&mut self, controller: C) {
        let id = controller.id();
        if self.active_controller() == Some(id) || self.queue.contains(id) {
            debug!("Controller {} is already being configured or queued", id);
            return;
        }
        self.known.retain(|c| c.id() != id);

        if controller.is_configured() {
            info!("Controller {} ({}) already configured", controller.name(), id);
            self.notify(Notification::Ready {
                controller: id,
                name: controller.name().to_string(),
            });
            self.known.push(controller);
            return;
        }

        info!("Controller {} ({}) needs configuration", controller.name(), id);
        self.queue.enqueue(controller);
        if self.active.is_none() {
            self.start_next();
        }
    }

    /// Forgets the controller. A running session for it ends without commit.
    ///
    /// Returns the controller handle if it was known to the configurator.
    pub fn controller_disconnected(&mut self, id: ControllerId) -> Option<C> {
        if self.active_controller() == Some(id) {
            warn!("Controller {} disconnected mid-session, discarding its edits", id);
            return self.finish_session(SessionEnd::Disconnected);
        }

        if let Some(controller) = self.queue.remove(id) {
            info!("Controller {} removed from queue", id);
            return Some(controller);
        }

        let position = self.known.iter().position(|c| c.id() == id)?;
        debug!("Known controller {} disconnected", id);
        Some(self.known.remove(position))
    }

    /// Feeds one raw input event to the active session
    pub fn handle_input(&mut self, event: &RawInputEvent) {
        let Some(session) = self.active.as_mut() else {
            return;
        };

        let ctx = NormalizerContext {
            active: session.controller.id(),
            dead_zone: session.controller.dead_zone(),
            axis_threshold: self.settings.axis_threshold,
            cancel_key: self.settings.cancel_key,
        };
        let Some(input) = normalize(event, &ctx) else {
            return;
        };

        let position = self.sequencer.position();
        let outcome = session.acceptance.handle(
            input,
            &ProtocolContext {
                entries: &self.entries,
                position,
            },
        );

        match outcome {
            Outcome::Ignored => {}
            Outcome::Rejected(e) => {
                info!("Rejected input at {:?}: {}", position, e);
                self.notify(Notification::Error {
                    message: e.to_string(),
                });
            }
            Outcome::Pending(candidate) => {
                debug!("{} held at {:?}", candidate, position);
                self.watchdog.arm();
            }
            Outcome::Waiting(candidate) => {
                debug!("{} armed at {:?}, waiting for neutral", candidate, position);
            }
            Outcome::Accepted(candidate) => {
                self.watchdog.cancel();
                info!("Accepted {} at {:?}", candidate, position);
                self.entries.record(position, Some(candidate));
                self.advance();
            }
            Outcome::Abort(reason) => {
                self.finish_session(SessionEnd::Aborted(reason));
            }
        }
    }

    /// Skips the current entry if the hold-to-skip deadline has passed.
    ///
    /// Returns `true` when an entry was skipped.
    pub fn poll_watchdog(&mut self) -> bool {
        if !self.watchdog.take_elapsed() {
            return false;
        }
        let Some(session) = self.active.as_mut() else {
            return false;
        };

        let held = session.acceptance.clear_pending();
        let position = self.sequencer.position();
        let description = self
            .entries
            .description(position)
            .unwrap_or_default()
            .to_string();
        info!(
            "Skipping {} ({:?} held longer than {:?})",
            description,
            held,
            self.watchdog.threshold()
        );

        self.entries.record(position, None);
        self.notify(Notification::Skipped { description });
        self.advance();
        true
    }

    /// Aborts the active session on behalf of the host
    pub fn cancel_session(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.finish_session(SessionEnd::Aborted(AbortReason::Requested));
        true
    }

    /// Clears a known controller's bindings, persisted ones included, and
    /// queues it for a fresh session
    pub fn reset_controller(&mut self, id: ControllerId) -> bool {
        let Some(position) = self.known.iter().position(|c| c.id() == id) else {
            warn!("Cannot reset controller {}: not idle or unknown", id);
            return false;
        };

        let mut controller = self.known.remove(position);
        controller.reset(true);
        info!("Controller {} reset, queueing for configuration", id);
        self.controller_connected(controller);
        true
    }

    pub fn active_controller(&self) -> Option<ControllerId> {
        self.active.as_ref().map(|s| s.controller.id())
    }

    pub fn queued(&self) -> Vec<ControllerId> {
        self.queue.ids().collect()
    }

    /// Current place in the sequence, `None` when idle
    pub fn position(&self) -> Option<Position> {
        self.active.as_ref().map(|_| self.sequencer.position())
    }

    pub fn acceptance(&self) -> Option<&AcceptanceState> {
        self.active.as_ref().map(|s| &s.acceptance)
    }

    pub fn entries(&self) -> &EntrySet {
        &self.entries
    }

    pub fn known(&self, id: ControllerId) -> Option<&C> {
        self.known.iter().find(|c| c.id() == id)
    }

    pub fn settings(&self) -> &ConfiguratorSettings {
        &self.settings
    }

    pub fn watchdog_deadline(&self) -> Option<Instant> {
        self.watchdog.deadline()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    fn start_next(&mut self) -> bool {
        let Some(controller) = self.queue.pop_next() else {
            return false;
        };

        self.entries.clear();
        self.sequencer.restart();
        self.watchdog.cancel();

        info!(
            "Starting configuration of {} ({})",
            controller.name(),
            controller.id()
        );
        self.notify(Notification::WillShow {
            controller: controller.id(),
            name: controller.name().to_string(),
        });
        self.active = Some(ActiveSession {
            controller,
            acceptance: AcceptanceState::default(),
        });

        if self.sequencer.is_complete() {
            info!("Nothing to configure, committing right away");
            self.finish_session(SessionEnd::Completed);
        } else {
            self.announce_entry();
        }
        true
    }

    fn advance(&mut self) {
        if self.sequencer.advance() == Position::Complete {
            self.finish_session(SessionEnd::Completed);
        } else {
            self.announce_entry();
        }
    }

    fn finish_session(&mut self, end: SessionEnd) -> Option<C> {
        self.watchdog.cancel();
        let ActiveSession { mut controller, .. } = self.active.take()?;
        let id = controller.id();
        let name = controller.name().to_string();

        let released = match end {
            SessionEnd::Completed => {
                Self::commit(&mut controller, &self.entries);
                self.notify(Notification::Ready {
                    controller: id,
                    name,
                });
                self.known.push(controller);
                None
            }
            SessionEnd::Aborted(reason) => {
                info!("Configuration of {} ({}) aborted: {:?}", name, id, reason);
                self.notify(Notification::Aborted {
                    controller: id,
                    name,
                });
                self.known.push(controller);
                None
            }
            SessionEnd::Disconnected => Some(controller),
        };

        self.entries.clear();
        if !self.start_next() {
            info!("No more controllers queued");
            self.notify(Notification::WillHide);
        }
        released
    }

    /// Replaces the controller's bindings with everything accepted in this session
    fn commit(controller: &mut C, entries: &EntrySet) {
        controller.reset(false);
        let mut bound = 0;

        for entry in &entries.buttons {
            if let Some(input) = entry.accepted {
                controller.bind(&entry.id, input);
                bound += 1;
            }
        }
        for entry in &entries.axes {
            for direction in [AxisDirection::Minus, AxisDirection::Plus] {
                if let Some(input) = entry.accepted(direction) {
                    controller.bind_axis(SignedAction::new(&entry.id, direction), input);
                    bound += 1;
                }
            }
        }

        if let Err(e) = controller.save() {
            error!("Failed to save bindings of {}: {}", controller.name(), e);
        }
        info!(
            "Committed {} bindings for {} ({})",
            bound,
            controller.name(),
            controller.id()
        );
    }

    fn announce_entry(&self) {
        let keyboard = self
            .active
            .as_ref()
            .is_some_and(|s| s.controller.id().is_keyboard());
        let input_noun = if keyboard { "key" } else { "button" };

        let position = self.sequencer.position();
        let Some(section) = position.section() else {
            return;
        };
        let (description, prompt) = match position {
            Position::Button(index) => {
                let Some(entry) = self.entries.buttons.get(index) else {
                    return;
                };
                let prompt = format!("Press a {} for {}", input_noun, entry.description);
                (entry.description.clone(), prompt)
            }
            Position::Axis { index, direction } => {
                let Some(entry) = self.entries.axes.get(index) else {
                    return;
                };
                let prompt = format!("Move {} towards {}", entry.description, entry.label(direction));
                (entry.description.clone(), prompt)
            }
            Position::Complete => return,
        };
        let notification = Notification::EntryChanged {
            section,
            description,
            prompt,
        };

        debug!("Prompting: {}", notification);
        self.notify(notification);
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.try_send(notification) {
            warn!("Failed to send notification: {}", e);
        }
    }
}
