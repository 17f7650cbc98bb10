use super::{ControllerId, ControllerProfile};
use crate::binding::handle::ConfiguratorCommand;
use crate::binding::normalizer::RawInputEvent;
use crate::persistence::{load_table, PersistenceAction};
use gilrs::{ev::Code, Axis, Button, Event, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(4);

/// D-pad reported as a hat with this index
const DPAD_HAT: u32 = 0;

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    /// Dead zone handed to every gamepad profile
    pub joystick_deadzone: f32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.2,
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),

    #[error("Thread error: {0}")]
    ThreadError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

/// Last reported d-pad position of one gamepad, `y < 0` is up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HatState {
    pub x: i8,
    pub y: i8,
}

impl HatState {
    /// Applies a d-pad axis reading; returns `true` if the position changed
    pub fn apply_axis(&mut self, axis: Axis, value: f32) -> bool {
        match axis {
            Axis::DPadX => set_component(&mut self.x, quantize(value)),
            // gilrs reports up as positive
            Axis::DPadY => set_component(&mut self.y, -quantize(value)),
            _ => false,
        }
    }

    /// Applies a d-pad button edge; returns `true` if the position changed
    pub fn apply_button(&mut self, button: Button, pressed: bool) -> bool {
        let (component, direction) = match button {
            Button::DPadUp => (&mut self.y, -1),
            Button::DPadDown => (&mut self.y, 1),
            Button::DPadLeft => (&mut self.x, -1),
            Button::DPadRight => (&mut self.x, 1),
            _ => return false,
        };

        if pressed {
            set_component(component, direction)
        } else if *component == direction {
            set_component(component, 0)
        } else {
            false
        }
    }
}

fn quantize(value: f32) -> i8 {
    if value > 0.5 {
        1
    } else if value < -0.5 {
        -1
    } else {
        0
    }
}

fn set_component(component: &mut i8, value: i8) -> bool {
    let changed = *component != value;
    *component = value;
    changed
}

fn is_dpad_button(button: Button) -> bool {
    matches!(
        button,
        Button::DPadUp | Button::DPadDown | Button::DPadLeft | Button::DPadRight
    )
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    settings: CollectorSettings,

    // Commands for the configurator
    command_sender: mpsc::Sender<ConfiguratorCommand>,

    // Stored bindings are looked up here on connect
    persistence: mpsc::Sender<PersistenceAction>,

    hats: HashMap<GamepadId, HatState>,
}

impl<S: CollectionState> EventCollector<S> {
    /// Builds the profile for a gamepad, with its stored table if there is one
    async fn announce(&mut self, id: GamepadId) -> Result<(), CollectorError> {
        let name = self.gilrs.gamepad(id).name().to_string();
        let controller = ControllerId::Gamepad(usize::from(id));

        let stored = match load_table(&self.persistence, &name).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Could not load stored bindings for {}: {}", name, e);
                None
            }
        };

        info!("Gamepad connected: {} ({})", name, controller);
        let profile = ControllerProfile::new(
            controller,
            name,
            self.settings.joystick_deadzone,
            stored,
            self.persistence.clone(),
        );
        self.send(ConfiguratorCommand::Connected(profile)).await
    }

    async fn send(&mut self, command: ConfiguratorCommand) -> Result<(), CollectorError> {
        self.command_sender
            .send(command)
            .await
            .map_err(|e| CollectorError::EventSendError(e.to_string()))
    }
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        command_sender: mpsc::Sender<ConfiguratorCommand>,
        persistence: mpsc::Sender<PersistenceAction>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(
            gilrs,
            settings,
            command_sender,
            persistence,
            HashMap::new(),
        ))
    }

    /// Announces every gamepad that was plugged in before startup
    pub async fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        let ids: Vec<GamepadId> = self.gilrs.gamepads().map(|(id, _)| id).collect();

        if ids.is_empty() {
            info!("No gamepad connected yet, waiting for connections");
        } else {
            info!("Found {} gamepads", ids.len());
        }
        for id in ids {
            self.announce(id).await?;
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        Ok(self.transition())
    }
}

impl EventCollector<Collecting> {
    /// Drains pending gilrs events, then sleeps for one poll interval
    pub async fn run_collection_loop(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        loop {
            while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
                self.handle_gilrs_event(id, event).await?;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Event Collector cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }

    async fn handle_gilrs_event(
        &mut self,
        id: GamepadId,
        event: EventType,
    ) -> Result<(), CollectorError> {
        let controller = ControllerId::Gamepad(usize::from(id));

        match event {
            EventType::Connected => self.announce(id).await,
            EventType::Disconnected => {
                warn!("Gamepad disconnected: {}", controller);
                self.hats.remove(&id);
                self.send(ConfiguratorCommand::Disconnected(controller)).await
            }
            EventType::ButtonPressed(button, code) => {
                self.button_edge(id, controller, button, code, true).await
            }
            EventType::ButtonReleased(button, code) => {
                self.button_edge(id, controller, button, code, false).await
            }
            EventType::AxisChanged(axis @ (Axis::DPadX | Axis::DPadY), value, _) => {
                let hat = self.hats.entry(id).or_default();
                if hat.apply_axis(axis, value) {
                    let hat = *hat;
                    self.send_hat(controller, hat).await
                } else {
                    Ok(())
                }
            }
            EventType::AxisChanged(axis, value, code) => {
                debug!("Axis changed: {:?} = {:.4}", axis, value);
                self.send(ConfiguratorCommand::Input(RawInputEvent::JoyAxis {
                    value,
                    index: code.into_u32(),
                    controller,
                }))
                .await
            }
            EventType::ButtonRepeated(button, _) => {
                debug!("Button repeat ignored: {:?}", button);
                Ok(())
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                Ok(())
            }
        }
    }

    async fn button_edge(
        &mut self,
        id: GamepadId,
        controller: ControllerId,
        button: Button,
        code: Code,
        pressed: bool,
    ) -> Result<(), CollectorError> {
        if is_dpad_button(button) {
            let hat = self.hats.entry(id).or_default();
            if hat.apply_button(button, pressed) {
                let hat = *hat;
                return self.send_hat(controller, hat).await;
            }
            return Ok(());
        }

        debug!(
            "Button {}: {:?} on {}",
            if pressed { "pressed" } else { "released" },
            button,
            controller
        );
        let index = code.into_u32();
        let event = if pressed {
            RawInputEvent::JoyButtonDown { index, controller }
        } else {
            RawInputEvent::JoyButtonUp { index, controller }
        };
        self.send(ConfiguratorCommand::Input(event)).await
    }

    async fn send_hat(
        &mut self,
        controller: ControllerId,
        hat: HatState,
    ) -> Result<(), CollectorError> {
        debug!("D-pad moved to ({}, {}) on {}", hat.x, hat.y, controller);
        self.send(ConfiguratorCommand::Input(RawInputEvent::JoyHat {
            x: hat.x,
            y: hat.y,
            index: DPAD_HAT,
            controller,
        }))
        .await
    }
}

/// Public interface for spawning and stopping the collector task
pub struct CollectorHandle {
    cancel: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl CollectorHandle {
    pub fn spawn(
        settings: Option<CollectorSettings>,
        command_sender: mpsc::Sender<ConfiguratorCommand>,
        persistence: mpsc::Sender<PersistenceAction>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let collector = EventCollector::create(settings, command_sender, persistence)?;
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task_handle = tokio::spawn(async move {
            match collector.initialize().await {
                Ok(mut collecting) => {
                    if let Err(e) = collecting.run_collection_loop(task_cancel).await {
                        error!("Collector task terminated with error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to initialize Event Collector: {}", e);
                }
            }
        });

        Ok(Self {
            cancel,
            task_handle: Some(task_handle),
        })
    }

    pub async fn shutdown(&mut self) -> Result<(), CollectorError> {
        self.cancel.cancel();
        match self.task_handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| CollectorError::ThreadError(e.to_string())),
            None => Ok(()),
        }
    }
}
