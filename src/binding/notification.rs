//! Messages for the presentation layer

use crate::binding::entry::Section;
use crate::controller::ControllerId;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// A session is about to begin for this controller
    WillShow {
        controller: ControllerId,
        name: String,
    },
    /// The prompt moved to another entry
    EntryChanged {
        section: Section,
        description: String,
        prompt: String,
    },
    /// Conflict or validation message for the current attempt
    Error { message: String },
    Skipped { description: String },
    /// Controller fully configured, freshly or from an earlier session
    Ready {
        controller: ControllerId,
        name: String,
    },
    /// Session ended by input without committing
    Aborted {
        controller: ControllerId,
        name: String,
    },
    /// No more controllers queued
    WillHide,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::WillShow { controller, name } => {
                write!(f, "Configuring {} ({})", name, controller)
            }
            Notification::EntryChanged { prompt, .. } => write!(f, "{}", prompt),
            Notification::Error { message } => write!(f, "{}", message),
            Notification::Skipped { description } => write!(f, "Skipped {}", description),
            Notification::Ready { controller, name } => {
                write!(f, "{} ({}) is ready", name, controller)
            }
            Notification::Aborted { controller, name } => {
                write!(f, "Configuration of {} ({}) aborted", name, controller)
            }
            Notification::WillHide => write!(f, "Configuration finished"),
        }
    }
}
