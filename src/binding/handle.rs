//! Async driver around [`ConfiguratorService`]
//!
//! The service is synchronous; this task feeds it commands, sleeps until the
//! next hold-to-skip or admission deadline and owns the shutdown signal.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Running ──► Stopped
//!                     │
//!          commands, skip deadline, connect delay
//! ```

use crate::binding::entry::{AxisEntry, ButtonEntry};
use crate::binding::error::ConfiguratorError;
use crate::binding::normalizer::RawInputEvent;
use crate::binding::notification::Notification;
use crate::binding::service::{ConfiguratorService, ConfiguratorSettings};
use crate::controller::{Controller, ControllerId, ControllerProfile};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 256;

/// Everything the outside world can tell the configurator
#[derive(Debug)]
pub enum ConfiguratorCommand {
    Input(RawInputEvent),
    Connected(ControllerProfile),
    Disconnected(ControllerId),
    /// Drop stored bindings and configure again
    Reset(ControllerId),
    /// Abort the running session
    Cancel,
}

#[state]
#[derive(Debug, Clone)]
pub enum DriverState {
    Initializing,
    Running,
    Stopped,
}

/// Connected controller waiting out the connect delay
#[derive(Debug)]
pub struct PendingAdmission {
    due: Instant,
    profile: ControllerProfile,
}

#[machine]
pub struct ConfiguratorDriver<S: DriverState> {
    service: ConfiguratorService<ControllerProfile>,
    commands: mpsc::Receiver<ConfiguratorCommand>,
    connect_delay: Duration,
    pending_admissions: Vec<PendingAdmission>,
}

impl<S: DriverState> ConfiguratorDriver<S> {
    pub fn service(&self) -> &ConfiguratorService<ControllerProfile> {
        &self.service
    }
}

impl ConfiguratorDriver<Initializing> {
    pub fn create(
        service: ConfiguratorService<ControllerProfile>,
        commands: mpsc::Receiver<ConfiguratorCommand>,
    ) -> Self {
        let connect_delay = service.settings().connect_delay;
        debug!("Creating configurator driver, connect delay {:?}", connect_delay);
        Self::new(service, commands, connect_delay, Vec::new())
    }

    pub fn start(self) -> ConfiguratorDriver<Running> {
        info!("Configurator driver running");
        self.transition()
    }
}

impl ConfiguratorDriver<Running> {
    /// Runs until the shutdown signal fires or every command sender is gone
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> ConfiguratorDriver<Stopped> {
        loop {
            let skip_deadline = self.service.watchdog_deadline();
            let admission_deadline = self.pending_admissions.iter().map(|p| p.due).min();

            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for configurator");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        info!("Command channel closed, stopping configurator");
                        break;
                    }
                },

                _ = sleep_until_opt(skip_deadline) => {
                    self.service.poll_watchdog();
                }

                _ = sleep_until_opt(admission_deadline) => {
                    self.admit_due();
                }
            }
        }

        self.transition()
    }

    fn handle_command(&mut self, command: ConfiguratorCommand) {
        match command {
            ConfiguratorCommand::Input(event) => self.service.handle_input(&event),
            ConfiguratorCommand::Connected(profile) => self.admit(profile),
            ConfiguratorCommand::Disconnected(id) => {
                let before = self.pending_admissions.len();
                self.pending_admissions.retain(|p| p.profile.id() != id);
                if self.pending_admissions.len() != before {
                    info!("Controller {} left before admission", id);
                } else if self.service.controller_disconnected(id).is_none() {
                    debug!("Disconnect of unknown controller {}", id);
                }
            }
            ConfiguratorCommand::Reset(id) => {
                self.service.reset_controller(id);
            }
            ConfiguratorCommand::Cancel => {
                if !self.service.cancel_session() {
                    debug!("Cancel requested while idle");
                }
            }
        }
    }

    fn admit(&mut self, profile: ControllerProfile) {
        if self.connect_delay.is_zero() {
            self.service.controller_connected(profile);
            return;
        }

        let id = profile.id();
        debug!("Delaying admission of {} by {:?}", id, self.connect_delay);
        self.pending_admissions.retain(|p| p.profile.id() != id);
        self.pending_admissions.push(PendingAdmission {
            due: Instant::now() + self.connect_delay,
            profile,
        });
    }

    fn admit_due(&mut self) {
        let now = Instant::now();
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_admissions)
            .into_iter()
            .partition(|p| p.due <= now);
        self.pending_admissions = waiting;

        for pending in due {
            self.service.controller_connected(pending.profile);
        }
    }
}

impl ConfiguratorDriver<Stopped> {
    pub fn pending_admissions(&self) -> usize {
        self.pending_admissions.len()
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Owns the driver task and its command channel
#[derive(Debug)]
pub struct ConfiguratorHandle {
    command_tx: mpsc::Sender<ConfiguratorCommand>,
    task_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ConfiguratorHandle {
    /// Builds the service and spawns its driver. Must be called inside a tokio runtime.
    pub fn spawn(
        settings: ConfiguratorSettings,
        buttons: Vec<ButtonEntry>,
        axes: Vec<AxisEntry>,
        notification_tx: mpsc::Sender<Notification>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let service = ConfiguratorService::new(settings, buttons, axes, notification_tx);
        let driver = ConfiguratorDriver::create(service, command_rx).start();

        let task_handle = tokio::spawn(async move {
            let stopped = driver.run_until_shutdown(shutdown_rx).await;
            info!(
                "Configurator stopped ({} queued, {} awaiting admission)",
                stopped.service().queued().len(),
                stopped.pending_admissions()
            );
        });

        Self {
            command_tx,
            task_handle: Some(task_handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn get_sender(&self) -> mpsc::Sender<ConfiguratorCommand> {
        self.command_tx.clone()
    }

    pub async fn send(&self, command: ConfiguratorCommand) -> Result<(), ConfiguratorError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| ConfiguratorError::ChannelError(e.to_string()))
    }

    /// Stops the driver. A running session is dropped without commit.
    pub async fn shutdown(&mut self) -> Result<(), ConfiguratorError> {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Configurator task already terminated");
            }
        }

        match self.task_handle.take() {
            Some(handle) => handle.await.map_err(|e| {
                error!("Configurator task panicked: {}", e);
                ConfiguratorError::ThreadError(e.to_string())
            }),
            None => {
                debug!("Configurator already shut down");
                Ok(())
            }
        }
    }
}
