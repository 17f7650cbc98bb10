//! Walks the entry list in configuration order
//!
//! ```text
//! buttons_first = true:   Button[0..n] ──► Axis[0]- ──► Axis[0]+ ──► ... ──► Complete
//! buttons_first = false:  Axis[0]- ──► Axis[0]+ ──► ... ──► Button[0..n] ──► Complete
//! ```
//!
//! An empty section is passed through without stopping.

use crate::binding::entry::{AxisDirection, Section};

/// Current place in the configuration sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Button(usize),
    Axis {
        index: usize,
        direction: AxisDirection,
    },
    /// Every entry has been visited; the session can be committed
    Complete,
}

impl Position {
    pub fn section(&self) -> Option<Section> {
        match self {
            Position::Button(_) => Some(Section::Buttons),
            Position::Axis { .. } => Some(Section::Axes),
            Position::Complete => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EntrySequencer {
    buttons_first: bool,
    button_count: usize,
    axis_count: usize,
    position: Position,
}

impl EntrySequencer {
    pub fn new(buttons_first: bool, button_count: usize, axis_count: usize) -> Self {
        let mut sequencer = Self {
            buttons_first,
            button_count,
            axis_count,
            position: Position::Complete,
        };
        sequencer.restart();
        sequencer
    }

    /// Back to the first entry of the first section
    pub fn restart(&mut self) -> Position {
        self.position = if self.buttons_first {
            self.enter_buttons(true)
        } else {
            self.enter_axes(true)
        };
        self.position
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_complete(&self) -> bool {
        self.position == Position::Complete
    }

    /// Moves exactly one step, whatever device produced the acceptance
    pub fn advance(&mut self) -> Position {
        self.position = match self.position {
            Position::Button(index) => self.advance_button(index),
            Position::Axis { index, direction } => self.advance_axis(index, direction),
            Position::Complete => Position::Complete,
        };
        self.position
    }

    fn advance_button(&self, index: usize) -> Position {
        if index + 1 < self.button_count {
            Position::Button(index + 1)
        } else if self.buttons_first {
            self.enter_axes(false)
        } else {
            Position::Complete
        }
    }

    fn advance_axis(&self, index: usize, direction: AxisDirection) -> Position {
        match direction {
            AxisDirection::Minus => Position::Axis {
                index,
                direction: AxisDirection::Plus,
            },
            AxisDirection::Plus if index + 1 < self.axis_count => Position::Axis {
                index: index + 1,
                direction: AxisDirection::Minus,
            },
            AxisDirection::Plus if !self.buttons_first => self.enter_buttons(false),
            AxisDirection::Plus => Position::Complete,
        }
    }

    fn enter_buttons(&self, first_section: bool) -> Position {
        if self.button_count > 0 {
            Position::Button(0)
        } else if first_section {
            self.enter_axes(false)
        } else {
            Position::Complete
        }
    }

    fn enter_axes(&self, first_section: bool) -> Position {
        if self.axis_count > 0 {
            Position::Axis {
                index: 0,
                direction: AxisDirection::Minus,
            }
        } else if first_section {
            self.enter_buttons(false)
        } else {
            Position::Complete
        }
    }
}
