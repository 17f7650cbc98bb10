//! # Persistence Module
//!
//! ## Why This Module Exists
//! A controller configured once should stay configured. This module holds the
//! per-controller binding table and writes it to disk so the next connection
//! of the same device skips the configuration session entirely.
//!
//! ## Key Abstractions
//! - **BindingTable**: Everything a committed session produced for one controller
//! - **BindingStore**: One TOML file per controller name below the config directory
//! - **PersistenceWorker**: Background task owning the store, driven through a channel
//!
//! ## Error Handling Strategy
//! File and format failures surface as [`PersistenceError`]. A failed save is
//! logged by the caller; the in-memory bindings stay valid for the current run.

pub mod binding_store;
pub mod persistence_worker;

use crate::binding::candidate::{AxisSign, CandidateInput};
use crate::binding::entry::AxisDirection;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use binding_store::BindingStore;
pub use persistence_worker::{load_table, PersistenceAction, PersistenceWorker};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize binding table: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to parse binding table: {0}")]
    Parse(#[from] toml::de::Error),

    /// Worker gone or its queue full
    #[error("Channel error: {0}")]
    ChannelError(String),
}

/// Digital action bound to a single input
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ButtonBinding {
    pub action: String,
    pub input: CandidateInput,
}

/// One logical direction of an axis action
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AxisBinding {
    pub action: String,
    pub sign: AxisDirection,
    /// The device reports the opposite sign for this direction, e.g. an
    /// up-is-negative stick bound to `+vertical`
    #[serde(default)]
    pub inverted: bool,
    pub input: CandidateInput,
}

/// Persisted bindings of one controller
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct BindingTable {
    /// Controller name, also used to derive the file name
    pub controller: String,
    #[serde(default)]
    pub configured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configured_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub buttons: Vec<ButtonBinding>,
    #[serde(default)]
    pub axes: Vec<AxisBinding>,
}

impl BindingTable {
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            configured: false,
            configured_at: None,
            buttons: Vec::new(),
            axes: Vec::new(),
        }
    }

    /// Drops all bindings, keeps the configured flag
    pub fn clear(&mut self) {
        self.buttons.clear();
        self.axes.clear();
    }

    pub fn bind_button(&mut self, action: &str, input: CandidateInput) {
        self.buttons.retain(|b| b.action != action);
        self.buttons.push(ButtonBinding {
            action: action.to_string(),
            input,
        });
    }

    pub fn bind_axis(&mut self, action: &str, sign: AxisDirection, input: CandidateInput) {
        let inverted = match input {
            CandidateInput::JoyAxis { direction, .. } => direction != expected_sign(sign),
            _ => false,
        };
        self.axes.retain(|a| !(a.action == action && a.sign == sign));
        self.axes.push(AxisBinding {
            action: action.to_string(),
            sign,
            inverted,
            input,
        });
    }

    pub fn button(&self, action: &str) -> Option<&ButtonBinding> {
        self.buttons.iter().find(|b| b.action == action)
    }

    pub fn axis(&self, action: &str, sign: AxisDirection) -> Option<&AxisBinding> {
        self.axes
            .iter()
            .find(|a| a.action == action && a.sign == sign)
    }

    pub fn len(&self) -> usize {
        self.buttons.len() + self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn expected_sign(direction: AxisDirection) -> AxisSign {
    match direction {
        AxisDirection::Minus => AxisSign::Negative,
        AxisDirection::Plus => AxisSign::Positive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::candidate::{HatAxis, HatDirection};

    #[test]
    fn test_rebinding_replaces_previous_input() {
        let mut table = BindingTable::new("pad");
        table.bind_button("accept", CandidateInput::JoyButton { index: 0 });
        table.bind_button("accept", CandidateInput::JoyButton { index: 3 });

        assert_eq!(table.buttons.len(), 1);
        assert_eq!(
            table.button("accept").map(|b| b.input),
            Some(CandidateInput::JoyButton { index: 3 })
        );
    }

    #[test]
    fn test_axis_inversion_follows_device_sign() {
        let mut table = BindingTable::new("pad");
        table.bind_axis(
            "vertical",
            AxisDirection::Minus,
            CandidateInput::JoyAxis {
                index: 1,
                direction: AxisSign::Positive,
            },
        );
        table.bind_axis(
            "horizontal",
            AxisDirection::Plus,
            CandidateInput::JoyAxis {
                index: 0,
                direction: AxisSign::Positive,
            },
        );
        table.bind_axis(
            "horizontal",
            AxisDirection::Minus,
            CandidateInput::JoyHat {
                index: 0,
                axis: HatAxis::X,
                value: HatDirection::Left,
            },
        );

        assert!(table.axis("vertical", AxisDirection::Minus).is_some_and(|a| a.inverted));
        assert!(!table.axis("horizontal", AxisDirection::Plus).is_some_and(|a| a.inverted));
        assert!(!table.axis("horizontal", AxisDirection::Minus).is_some_and(|a| a.inverted));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_toml_layout() {
        let mut table = BindingTable::new("Pad");
        table.configured = true;
        table.bind_button("accept", CandidateInput::JoyButton { index: 3 });
        table.bind_axis(
            "horizontal",
            AxisDirection::Plus,
            CandidateInput::JoyAxis {
                index: 0,
                direction: AxisSign::Positive,
            },
        );

        let text = toml::to_string_pretty(&table).expect("serialize");
        assert!(text.contains("controller = \"Pad\""));
        assert!(text.contains("[[buttons]]"));
        assert!(text.contains("kind = \"JoyButton\""));
        assert!(!text.contains("configured_at"));

        let parsed: BindingTable = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_missing_sections_default() {
        let parsed: BindingTable = toml::from_str("controller = \"Pad\"\n").expect("parse");
        assert!(!parsed.configured);
        assert!(parsed.is_empty());
    }
}
