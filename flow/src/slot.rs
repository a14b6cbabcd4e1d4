//! Probe slot arena.
//!
//! Each optional key owns exactly one slot for the whole program. Slots
//! are request-local: the engine binds them while evaluating one
//! transaction and forgets them afterwards.

use crate::error::ConfigError;
use verdict_core::SlotId;

/// Allocator of request-local probe slots, shared by every accessor of a
/// program so that slots never collide across scopes.
#[derive(Debug, Clone, Default)]
pub struct SlotArena {
    labels: Vec<String>,
}

impl SlotArena {
    /// Scratch slots the engine provides per evaluation.
    pub const CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, label: impl Into<String>) -> Result<SlotId, ConfigError> {
        if self.labels.len() >= Self::CAPACITY {
            return Err(ConfigError::SlotsExhausted(Self::CAPACITY));
        }
        let slot = SlotId(self.labels.len() as u16);
        self.labels.push(label.into());
        Ok(slot)
    }

    pub fn label(&self, slot: SlotId) -> Option<&str> {
        self.labels.get(slot.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
