use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::core::Result;

type Key = (String, String);

/// One async mutex per `(table, identifier value)`.
///
/// Entries are weak so a key's mutex is freed once nobody holds or waits on
/// it; dead entries are swept whenever a new key is inserted.
#[derive(Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<Key, Weak<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, table: &str, identifier: &str) -> Result<OwnedMutexGuard<()>> {
        let slot = self.slot(table, identifier)?;
        Ok(slot.lock_owned().await)
    }

    fn slot(&self, table: &str, identifier: &str) -> Result<Arc<AsyncMutex<()>>> {
        let mut slots = self.slots.lock()?;
        let key = (table.to_string(), identifier.to_string());

        if let Some(existing) = slots.get(&key).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        slots.retain(|_, weak| weak.strong_count() > 0);
        let slot = Arc::new(AsyncMutex::new(()));
        slots.insert(key, Arc::downgrade(&slot));
        Ok(slot)
    }

    #[cfg(test)]
    fn live_keys(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.values().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }
}
