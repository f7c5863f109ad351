//! Swappable notification handler.

use std::sync::{Arc, PoisonError, RwLock};

use super::resource::ChangeNotification;

/// A notification handler.
pub type Callback = Arc<dyn Fn(&ChangeNotification) + Send + Sync>;

/// Holds the current handler for a subscription.
///
/// The channel reads the handler at delivery time, so replacing it takes
/// effect for the next notification without reopening the channel.
#[derive(Default)]
pub struct CallbackCell {
    slot: RwLock<Option<Callback>>,
}

impl CallbackCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `callback`, replacing any previous one.
    pub fn replace(&self, callback: Callback) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    /// Removes the current handler.
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a handler is installed.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Calls the current handler. Returns `false` if none is set and the
    /// notification was dropped.
    pub fn invoke(&self, notification: &ChangeNotification) -> bool {
        let current = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(callback) => {
                callback(notification);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for CallbackCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackCell")
            .field("set", &self.is_set())
            .finish()
    }
}
