use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per booking id. Holding the guard across
/// read-validate-write-publish keeps per-booking notifications in commit
/// order while other bookings proceed in parallel.
///
/// An entry lives only while someone holds or waits for it.
#[derive(Default)]
pub struct BookingLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive access to one booking. Dropping it releases the mutex and
/// removes the map entry when no other task is waiting.
pub struct BookingGuard<'a> {
    locks: &'a BookingLocks,
    booking_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, booking_id: &str) -> BookingGuard<'_> {
        let lock = Arc::clone(&self.locks.entry(booking_id.to_string()).or_default());
        let guard = lock.lock_owned().await;
        BookingGuard {
            locks: self,
            booking_id: booking_id.to_string(),
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn release(&self, booking_id: &str) {
        // Waiters hold a clone of the Arc, so a count of one means only the
        // map still refers to the mutex.
        self.locks
            .remove_if(booking_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl Drop for BookingGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.booking_id);
    }
}
