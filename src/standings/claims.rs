//! Per-date claims so only one task computes a given date's snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// In-process registry of per-date locks.
///
/// Entries exist only while some task holds or waits for a date.
#[derive(Debug, Default)]
pub struct DateClaims {
    locks: Mutex<HashMap<NaiveDate, Arc<AsyncMutex<()>>>>,
}

impl DateClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until this task holds the claim for `date`.
    pub async fn acquire(&self, date: NaiveDate) -> DateClaim<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(date).or_default())
        };

        DateClaim {
            claims: self,
            date,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of dates currently claimed or awaited.
    #[cfg(test)]
    fn active(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, date: NaiveDate) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = locks.get(&date) {
            // Only the map still references it: nobody is waiting.
            if Arc::strong_count(lock) == 1 {
                locks.remove(&date);
            }
        }
    }
}

/// Held claim on one date. Released on drop.
pub struct DateClaim<'a> {
    claims: &'a DateClaims,
    date: NaiveDate,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DateClaim<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.claims.release(self.date);
    }
}
