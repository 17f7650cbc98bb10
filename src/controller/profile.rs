use super::{Controller, ControllerId, SignedAction};
use crate::binding::candidate::CandidateInput;
use crate::persistence::{BindingTable, PersistenceAction, PersistenceError};
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Name under which keyboard bindings are stored
pub const KEYBOARD_NAME: &str = "Keyboard";

/// A connected device together with its binding table.
///
/// Saving hands a copy of the table to the persistence worker; the profile
/// never touches the file system itself.
#[derive(Debug)]
pub struct ControllerProfile {
    id: ControllerId,
    name: String,
    dead_zone: f32,
    table: BindingTable,
    persistence: mpsc::Sender<PersistenceAction>,
}

impl ControllerProfile {
    /// `stored` is the table found on disk for this controller name, if any
    pub fn new(
        id: ControllerId,
        name: impl Into<String>,
        dead_zone: f32,
        stored: Option<BindingTable>,
        persistence: mpsc::Sender<PersistenceAction>,
    ) -> Self {
        let name = name.into();
        let table = match stored {
            Some(table) => {
                debug!(
                    "Using {} stored bindings for {} (configured: {})",
                    table.len(),
                    name,
                    table.configured
                );
                table
            }
            None => BindingTable::new(name.clone()),
        };

        Self {
            id,
            name,
            dead_zone,
            table,
            persistence,
        }
    }

    pub fn keyboard(
        stored: Option<BindingTable>,
        persistence: mpsc::Sender<PersistenceAction>,
    ) -> Self {
        Self::new(ControllerId::Keyboard, KEYBOARD_NAME, 0.0, stored, persistence)
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    fn send(&self, action: PersistenceAction) -> Result<(), PersistenceError> {
        self.persistence
            .try_send(action)
            .map_err(|e| PersistenceError::ChannelError(e.to_string()))
    }
}

impl Controller for ControllerProfile {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dead_zone(&self) -> f32 {
        self.dead_zone
    }

    fn is_configured(&self) -> bool {
        self.table.configured
    }

    fn reset(&mut self, clear_persisted: bool) {
        self.table.clear();
        if !clear_persisted {
            return;
        }

        self.table.configured = false;
        self.table.configured_at = None;
        info!("Clearing stored bindings of {}", self.name);
        if let Err(e) = self.send(PersistenceAction::Reset {
            controller: self.name.clone(),
            response_tx: None,
        }) {
            warn!("Failed to clear stored bindings of {}: {}", self.name, e);
        }
    }

    fn bind(&mut self, action_id: &str, input: CandidateInput) {
        debug!("{}: {} -> {}", self.name, action_id, input);
        self.table.bind_button(action_id, input);
    }

    fn bind_axis(&mut self, action: SignedAction, input: CandidateInput) {
        debug!("{}: {} -> {}", self.name, action, input);
        self.table.bind_axis(&action.id, action.sign, input);
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        self.table.configured = true;
        self.table.configured_at = Some(Local::now());
        self.send(PersistenceAction::Save {
            table: self.table.clone(),
            response_tx: None,
        })
    }
}
