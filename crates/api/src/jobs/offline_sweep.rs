//! Heartbeat sweep: reconcile online/offline status with observed liveness.
//!
//! Presence is a pure function of heartbeat age versus the staleness
//! threshold, re-evaluated on every pass. The sweep owns this axis: liveness
//! pings only stamp `last_seen_at`, and the next pass reclassifies the
//! device, so a ping can lag visible "online" status by up to one period.
//! The lock axis is never touched here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, warn};

use domain::models::Presence;
use domain::store::{DeviceStore, StoreError};

use super::runner::Job;

/// Heartbeat age beyond which a device counts as offline. Contract constant.
pub const STALENESS_THRESHOLD_SECS: i64 = 20 * 60;

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Devices read from the store.
    pub scanned: usize,
    /// Devices whose presence changed and was persisted.
    pub transitioned: usize,
    /// Devices whose presence write failed and was skipped.
    pub failed: usize,
}

/// Periodic job demoting stale devices and promoting fresh ones.
pub struct OfflineSweepJob {
    devices: Arc<dyn DeviceStore>,
    period: Duration,
    threshold: chrono::Duration,
}

impl OfflineSweepJob {
    pub fn new(devices: Arc<dyn DeviceStore>, period: Duration) -> Self {
        Self {
            devices,
            period,
            threshold: chrono::Duration::seconds(STALENESS_THRESHOLD_SECS),
        }
    }

    /// One full pass over the fleet at the current instant.
    pub async fn sweep(&self) -> Result<SweepSummary, StoreError> {
        self.sweep_at(Utc::now()).await
    }

    /// One full pass evaluating heartbeat ages against `now`.
    ///
    /// The pass is not atomic across the device set; each single-record
    /// write is the unit of atomicity, and concurrent presence updates
    /// resolve as last-write-wins per device.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepSummary, StoreError> {
        let devices = self.devices.list_all().await?;
        let mut summary = SweepSummary {
            scanned: devices.len(),
            transitioned: 0,
            failed: 0,
        };

        for mut device in devices {
            // Never-reported devices are skipped, not demoted.
            let Some(age) = device.heartbeat_age(now) else {
                continue;
            };

            let expected = Presence::classify(age, self.threshold);
            if device.presence == expected {
                // Idempotent no-op; avoids write amplification.
                continue;
            }

            device.presence = expected;
            device.updated_at = now;

            // One device's failure must not abort the rest of the pass.
            match self.devices.put(&device).await {
                Ok(_) => {
                    summary.transitioned += 1;
                    counter!("presence_sweep_transitions_total", "presence" => expected.to_string())
                        .increment(1);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(device_id = device.id, error = %e, "presence write failed during sweep");
                }
            }
        }

        Ok(summary)
    }
}

#[async_trait::async_trait]
impl Job for OfflineSweepJob {
    fn name(&self) -> &'static str {
        "offline_sweep"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run(&self) -> Result<(), String> {
        let summary = self
            .sweep()
            .await
            .map_err(|e| format!("device scan failed: {e}"))?;

        if summary.transitioned > 0 || summary.failed > 0 {
            info!(
                scanned = summary.scanned,
                transitioned = summary.transitioned,
                failed = summary.failed,
                "presence sweep applied changes"
            );
        }

        Ok(())
    }
}
