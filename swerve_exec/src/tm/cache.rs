//! Last known value of every dashboard channel

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::dash::{ChannelId, ChannelValue};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Telemetry cache, indexed by channel ID.
///
/// A slot is `None` until the first value for that channel arrives. Once set, a slot is only ever
/// overwritten by a newer value, so a failing source leaves its last good value in place.
#[derive(Debug, Default, Clone)]
pub struct TmCache {
    values: Vec<Option<ChannelValue>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TmCache {
    /// Add an empty slot and return its ID.
    pub fn add_channel(&mut self) -> ChannelId {
        self.values.push(None);
        ChannelId((self.values.len() - 1) as u32)
    }

    /// Number of slots in the cache.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store a value. Returns `true` if the stored value changed.
    ///
    /// Unknown IDs are ignored.
    pub fn set(&mut self, id: ChannelId, value: ChannelValue) -> bool {
        match self.values.get_mut(id.0 as usize) {
            Some(slot) if *slot == Some(value) => false,
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Get the cached value of a channel.
    pub fn get(&self, id: ChannelId) -> Option<&ChannelValue> {
        self.values.get(id.0 as usize).and_then(|v| v.as_ref())
    }

    /// Iterate over every channel which has a value.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &ChannelValue)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (ChannelId(i as u32), v)))
    }
}
