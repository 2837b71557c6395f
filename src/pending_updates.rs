use crate::domain::UtilityValue;
use crate::domain::commands::Action;
use std::collections::VecDeque;

/// An optimistic update waiting for the device to confirm or reject it.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingUpdate {
    pub id: u64,
    pub action: Action,
    pub utility: String,
    pub previous: Option<UtilityValue>,
    pub applied: UtilityValue,
}

/// Optimistic updates in the order their commands were sent.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    updates: VecDeque<PendingUpdate>,
}

impl PendingUpdates {
    pub fn push(&mut self, update: PendingUpdate) {
        self.updates.push_back(update);
    }

    /// Removes the update a response belongs to: by request id when the device echoed one,
    /// otherwise the oldest update sent with the same action.
    pub fn take_matching(&mut self, id: Option<u64>, action: &str) -> Option<PendingUpdate> {
        let index = match id {
            Some(id) => self.updates.iter().position(|update| update.id == id),
            None => self.updates.iter().position(|update| update.action.as_str() == action),
        }?;
        self.updates.remove(index)
    }

    /// Forgets every update of `utility`, the device just reported its actual value.
    pub fn discard_utility(&mut self, utility: &str) -> usize {
        let before = self.updates.len();
        self.updates.retain(|update| update.utility != utility);
        before - self.updates.len()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}
