//! Deferred unlock scheduler.
//!
//! Guarantees an emergency lock is time-bounded: unless cancelled or
//! superseded, a one-shot timer releases the lock after a fixed delay.
//! Exactly one timer may be pending per device; arming again replaces the
//! previous timer rather than stacking a second one.
//!
//! The fire path re-reads the device by identity instead of writing back the
//! snapshot captured at arm time, so state changes made during the delay
//! window (manual unlock, version report, deletion) are not clobbered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use domain::models::LockState;
use domain::store::DeviceStore;

/// Fixed grace period after which an emergency lock auto-releases.
pub const AUTO_UNLOCK_DELAY: Duration = Duration::from_secs(5 * 60);

/// Per-device one-shot unlock timers. Cheap to clone and share.
#[derive(Clone)]
pub struct UnlockScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    devices: Arc<dyn DeviceStore>,
    delay: Duration,
    pending: Mutex<HashMap<i64, PendingUnlock>>,
    next_seq: AtomicU64,
}

struct PendingUnlock {
    seq: u64,
    task: JoinHandle<()>,
}

impl UnlockScheduler {
    pub fn new(devices: Arc<dyn DeviceStore>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                devices,
                delay,
                pending: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Arm (or re-arm) the one-shot unlock timer for a device.
    ///
    /// Any timer already pending for the same device is cancelled and
    /// replaced; the clock starts over from now.
    pub fn arm(&self, device_id: i64) {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst);
        // Sample the deadline now, not when the spawned task first polls, so
        // the clock truly starts over at arm time.
        let sleep = tokio::time::sleep(self.inner.delay);
        let inner = Arc::clone(&self.inner);

        // Hold the slot lock across spawn + insert so the timer task cannot
        // observe the map before its own entry is registered.
        let mut pending = lock_pending(&self.inner.pending);

        let task = tokio::spawn(async move {
            sleep.await;

            // Deregister first. A sequence mismatch means a newer timer
            // superseded this one while it slept; that timer owns the slot.
            let current = {
                let mut pending = lock_pending(&inner.pending);
                match pending.get(&device_id) {
                    Some(entry) if entry.seq == seq => {
                        pending.remove(&device_id);
                        true
                    }
                    _ => false,
                }
            };

            if current {
                inner.fire(device_id).await;
            }
        });

        if let Some(previous) = pending.insert(device_id, PendingUnlock { seq, task }) {
            previous.task.abort();
            debug!(device_id, "superseded pending auto unlock");
        }
    }

    /// Cancel any pending unlock timer for a device.
    ///
    /// Safe to call when no timer is armed.
    pub fn cancel(&self, device_id: i64) {
        if let Some(entry) = lock_pending(&self.inner.pending).remove(&device_id) {
            entry.task.abort();
            debug!(device_id, "cancelled pending auto unlock");
        }
    }

    /// Number of timers currently pending.
    pub fn pending_count(&self) -> usize {
        lock_pending(&self.inner.pending).len()
    }
}

impl Inner {
    async fn fire(&self, device_id: i64) {
        let device = match self.devices.get(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                debug!(device_id, "device deleted before auto unlock fired");
                return;
            }
            Err(e) => {
                counter!("deferred_unlock_failed_total").increment(1);
                warn!(device_id, error = %e, "auto unlock read failed; not retrying");
                return;
            }
        };

        if device.lock_state == LockState::Unlocked {
            debug!(device_id, "device already unlocked at fire time");
            return;
        }

        let mut device = device;
        device.lock_state = LockState::Unlocked;
        device.updated_at = Utc::now();

        match self.devices.put(&device).await {
            Ok(_) => {
                counter!("deferred_unlock_fired_total").increment(1);
                info!(device_id, "auto unlock released emergency lock");
            }
            Err(e) => {
                // Best effort: the write is not retried, and the device stays
                // locked until the next explicit action.
                counter!("deferred_unlock_failed_total").increment(1);
                warn!(device_id, error = %e, "auto unlock write failed; not retrying");
            }
        }
    }
}

fn lock_pending(
    pending: &Mutex<HashMap<i64, PendingUnlock>>,
) -> MutexGuard<'_, HashMap<i64, PendingUnlock>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
