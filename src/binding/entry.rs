//! Logical actions waiting for a physical input

use crate::binding::candidate::CandidateInput;
use crate::binding::sequencer::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two halves of the entry list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Buttons,
    Axes,
}

/// One of the two direction slots of an [`AxisEntry`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisDirection {
    /// Slot 0, `accepted0`
    Minus,
    /// Slot 1, `accepted1`
    Plus,
}

impl AxisDirection {
    pub fn symbol(self) -> char {
        match self {
            AxisDirection::Minus => '-',
            AxisDirection::Plus => '+',
        }
    }
}

impl fmt::Display for AxisDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ButtonEntry {
    pub id: String,
    pub description: String,
    #[serde(skip)]
    pub accepted: Option<CandidateInput>,
}

impl ButtonEntry {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            accepted: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisEntry {
    pub id: String,
    pub description: String,
    pub minus_label: String,
    pub plus_label: String,
    #[serde(skip)]
    pub accepted0: Option<CandidateInput>,
    #[serde(skip)]
    pub accepted1: Option<CandidateInput>,
}

impl AxisEntry {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        minus_label: impl Into<String>,
        plus_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            minus_label: minus_label.into(),
            plus_label: plus_label.into(),
            accepted0: None,
            accepted1: None,
        }
    }

    pub fn accepted(&self, direction: AxisDirection) -> Option<CandidateInput> {
        match direction {
            AxisDirection::Minus => self.accepted0,
            AxisDirection::Plus => self.accepted1,
        }
    }

    pub fn label(&self, direction: AxisDirection) -> &str {
        match direction {
            AxisDirection::Minus => &self.minus_label,
            AxisDirection::Plus => &self.plus_label,
        }
    }

    fn set(&mut self, direction: AxisDirection, candidate: Option<CandidateInput>) {
        match direction {
            AxisDirection::Minus => self.accepted0 = candidate,
            AxisDirection::Plus => self.accepted1 = candidate,
        }
    }
}

/// Ordered button and axis entries of the controller being configured
#[derive(Clone, Debug, Default)]
pub struct EntrySet {
    pub buttons: Vec<ButtonEntry>,
    pub axes: Vec<AxisEntry>,
}

impl EntrySet {
    pub fn new(buttons: Vec<ButtonEntry>, axes: Vec<AxisEntry>) -> Self {
        Self { buttons, axes }
    }

    /// Forgets everything accepted so far
    pub fn clear(&mut self) {
        for entry in &mut self.buttons {
            entry.accepted = None;
        }
        for entry in &mut self.axes {
            entry.accepted0 = None;
            entry.accepted1 = None;
        }
    }

    /// Stores the outcome for the entry at `position`; `None` records a skip
    pub fn record(&mut self, position: Position, candidate: Option<CandidateInput>) {
        match position {
            Position::Button(index) => {
                if let Some(entry) = self.buttons.get_mut(index) {
                    entry.accepted = candidate;
                }
            }
            Position::Axis { index, direction } => {
                if let Some(entry) = self.axes.get_mut(index) {
                    entry.set(direction, candidate);
                }
            }
            Position::Complete => {}
        }
    }

    pub fn description(&self, position: Position) -> Option<&str> {
        match position {
            Position::Button(index) => self.buttons.get(index).map(|e| e.description.as_str()),
            Position::Axis { index, .. } => self.axes.get(index).map(|e| e.description.as_str()),
            Position::Complete => None,
        }
    }

    /// Every candidate accepted in this session
    pub fn accepted(&self) -> impl Iterator<Item = (&str, CandidateInput)> + '_ {
        let buttons = self
            .buttons
            .iter()
            .filter_map(|e| e.accepted.map(|c| (e.description.as_str(), c)));
        let axes = self.axes.iter().flat_map(|e| {
            [e.accepted0, e.accepted1]
                .into_iter()
                .flatten()
                .map(move |c| (e.description.as_str(), c))
        });
        buttons.chain(axes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntrySet {
        EntrySet::new(
            vec![ButtonEntry::new("accept", "Accept")],
            vec![AxisEntry::new("move", "Move", "Left", "Right")],
        )
    }

    #[test]
    fn test_record_and_clear() {
        let mut entries = sample();
        entries.record(Position::Button(0), Some(CandidateInput::JoyButton { index: 1 }));
        entries.record(
            Position::Axis {
                index: 0,
                direction: AxisDirection::Plus,
            },
            Some(CandidateInput::JoyButton { index: 2 }),
        );

        assert_eq!(
            entries.buttons[0].accepted,
            Some(CandidateInput::JoyButton { index: 1 })
        );
        assert_eq!(entries.axes[0].accepted0, None);
        assert_eq!(
            entries.axes[0].accepted1,
            Some(CandidateInput::JoyButton { index: 2 })
        );
        assert_eq!(entries.accepted().count(), 2);

        entries.clear();
        assert_eq!(entries.accepted().count(), 0);
    }

    #[test]
    fn test_record_out_of_range_is_ignored() {
        let mut entries = sample();
        entries.record(Position::Button(7), Some(CandidateInput::JoyButton { index: 1 }));
        entries.record(Position::Complete, Some(CandidateInput::JoyButton { index: 1 }));
        assert_eq!(entries.accepted().count(), 0);
    }

    #[test]
    fn test_axis_entry_labels() {
        let entry = AxisEntry::new("move", "Move", "Left", "Right");
        assert_eq!(entry.label(AxisDirection::Minus), "Left");
        assert_eq!(entry.label(AxisDirection::Plus), "Right");
        assert_eq!(AxisDirection::Plus.to_string(), "+");
    }
}
