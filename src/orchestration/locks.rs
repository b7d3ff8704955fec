//! In-process per-tournament mutexes.
//!
//! The SQLite row lock taken by `Repository::lock_tournament` serialises
//! writers across processes; these mutexes keep tasks of one process from
//! queueing on SQLite's busy timeout for the same tournament.

use crate::domain::TournamentId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct TournamentLocks {
    inner: Arc<Mutex<HashMap<TournamentId, Arc<AsyncMutex<()>>>>>,
}

impl TournamentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one tournament.
    ///
    /// Entries nobody holds or waits on are pruned here, so the map only
    /// tracks tournaments with live guards.
    pub async fn acquire(&self, tournament_id: TournamentId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = match self.inner.lock() {
                Ok(map) => map,
                Err(poisoned) => poisoned.into_inner(),
            };
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(tournament_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        match self.inner.lock() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
