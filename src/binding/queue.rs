//! Controllers waiting for their turn

use crate::controller::{Controller, ControllerId};
use std::collections::VecDeque;
use tracing::debug;

/// FIFO of controllers awaiting configuration; each id appears at most once
#[derive(Debug)]
pub struct ControllerQueue<C> {
    waiting: VecDeque<C>,
}

impl<C> Default for ControllerQueue<C> {
    fn default() -> Self {
        Self {
            waiting: VecDeque::new(),
        }
    }
}

impl<C: Controller> ControllerQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the controller; returns `false` if its id is already queued
    pub fn enqueue(&mut self, controller: C) -> bool {
        let id = controller.id();
        if self.contains(id) {
            debug!("Controller {} already queued", id);
            return false;
        }
        self.waiting.push_back(controller);
        debug!("Controller {} queued, {} waiting", id, self.waiting.len());
        true
    }

    pub fn remove(&mut self, id: ControllerId) -> Option<C> {
        let position = self.waiting.iter().position(|c| c.id() == id)?;
        self.waiting.remove(position)
    }

    pub fn pop_next(&mut self) -> Option<C> {
        self.waiting.pop_front()
    }

    pub fn contains(&self, id: ControllerId) -> bool {
        self.waiting.iter().any(|c| c.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ControllerId> + '_ {
        self.waiting.iter().map(|c| c.id())
    }
}
