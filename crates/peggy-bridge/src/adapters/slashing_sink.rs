use crate::domain::SlashingSignal;
use crate::error::{BridgeResult, StoreError};
use crate::ports::SlashingSink;
use std::sync::RwLock;

/// Collects slashing signals for the host (or a test) to drain.
pub struct InMemorySlashingSink {
    pending: RwLock<Vec<SlashingSignal>>,
}

impl InMemorySlashingSink {
    pub fn new() -> Self {
        Self {
            pending: RwLock::new(Vec::new()),
        }
    }

    pub fn pending(&self) -> BridgeResult<Vec<SlashingSignal>> {
        Ok(self
            .pending
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .clone())
    }

    /// Take all signals received so far.
    pub fn drain(&self) -> BridgeResult<Vec<SlashingSignal>> {
        let mut pending = self.pending.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(std::mem::take(&mut *pending))
    }
}

impl Default for InMemorySlashingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SlashingSink for InMemorySlashingSink {
    fn submit(&self, signal: SlashingSignal) -> BridgeResult<()> {
        self.pending
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .push(signal);
        Ok(())
    }
}
