//! End-to-end lifecycle tests for the presence and lock transitions,
//! exercising the fleet service, the unlock scheduler, and the heartbeat
//! sweep together on a paused clock.

mod common;

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use common::{settle, TestFleet};
use domain::models::{LockState, Presence};
use domain::store::DeviceStore;
use fleet_presence_api::services::AUTO_UNLOCK_DELAY;
use shared::pagination::PageQuery;

#[tokio::test(start_paused = true)]
async fn test_emergency_lock_auto_releases_after_grace_period() {
    // Lock with no follow-up action: the deferred timer releases the lock
    // after the grace period and the audit event carries the lock details.
    let harness = TestFleet::new();
    let device = harness.register_device().await;

    let locked_around = Utc::now();
    let locked = harness
        .fleet
        .emergency_lock(device.id, "123456")
        .await
        .unwrap();
    assert_eq!(locked.lock_state, LockState::Locked);
    assert_eq!(harness.unlock.pending_count(), 1);

    tokio::time::advance(AUTO_UNLOCK_DELAY + Duration::from_secs(1)).await;
    settle().await;

    let released = harness.store.get(device.id).await.unwrap().unwrap();
    assert_eq!(released.lock_state, LockState::Unlocked);
    assert_eq!(harness.unlock.pending_count(), 0);

    let events = harness
        .fleet
        .lock_events(device.id, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(events.total, 1);
    assert_eq!(events.rows[0].lock_code, "123456");
    let drift = (events.rows[0].locked_at - locked_around).num_seconds().abs();
    assert!(drift <= 5, "locked_at should record the lock instant");
}

#[tokio::test(start_paused = true)]
async fn test_manual_unlock_leaves_no_deferred_write_behind() {
    // Lock, then unlock manually two minutes in: nothing touches the device
    // when the original five-minute deadline passes.
    let harness = TestFleet::new();
    let device = harness.register_device().await;

    harness
        .fleet
        .emergency_lock(device.id, "654321")
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(2 * 60)).await;

    let unlocked = harness.fleet.manual_unlock(device.id).await.unwrap();
    assert_eq!(unlocked.lock_state, LockState::Unlocked);
    assert_eq!(harness.unlock.pending_count(), 0);

    let writes_before = harness.store.device_writes();
    tokio::time::advance(AUTO_UNLOCK_DELAY).await;
    settle().await;

    assert_eq!(harness.store.device_writes(), writes_before);
    assert_eq!(
        harness.store.get(device.id).await.unwrap().unwrap().lock_state,
        LockState::Unlocked
    );
}

#[tokio::test(start_paused = true)]
async fn test_relocking_restarts_the_grace_period() {
    // A second emergency lock supersedes the first timer; the release
    // happens once, at the later deadline.
    let harness = TestFleet::new();
    let device = harness.register_device().await;

    harness
        .fleet
        .emergency_lock(device.id, "111111")
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(3 * 60)).await;
    harness
        .fleet
        .emergency_lock(device.id, "222222")
        .await
        .unwrap();
    assert_eq!(harness.unlock.pending_count(), 1);

    // The first lock's deadline passes without a release.
    tokio::time::advance(Duration::from_secs(2 * 60 + 1)).await;
    settle().await;
    assert_eq!(
        harness.store.get(device.id).await.unwrap().unwrap().lock_state,
        LockState::Locked
    );

    tokio::time::advance(Duration::from_secs(3 * 60)).await;
    settle().await;
    assert_eq!(
        harness.store.get(device.id).await.unwrap().unwrap().lock_state,
        LockState::Unlocked
    );

    // Both locks were audited even though only one release happened.
    let events = harness
        .fleet
        .lock_events(device.id, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(events.total, 2);
    assert_eq!(events.rows[0].lock_code, "222222");
}

#[tokio::test]
async fn test_ping_then_sweep_brings_device_online() {
    // A liveness ping does not flip status by itself; the next sweep does.
    let harness = TestFleet::new();
    let device = harness.register_device().await;

    let pinged = harness
        .fleet
        .record_liveness(device.device_token)
        .await
        .unwrap();
    assert_eq!(pinged.presence, Presence::Offline);

    let sweep = harness.sweep_job();
    sweep.sweep_at(Utc::now()).await.unwrap();
    assert_eq!(
        harness.store.get(device.id).await.unwrap().unwrap().presence,
        Presence::Online
    );

    // With no further pings, a pass past the staleness threshold demotes it.
    let later = Utc::now() + ChronoDuration::minutes(21);
    sweep.sweep_at(later).await.unwrap();
    assert_eq!(
        harness.store.get(device.id).await.unwrap().unwrap().presence,
        Presence::Offline
    );
}

#[tokio::test(start_paused = true)]
async fn test_sweep_and_lock_axes_stay_independent() {
    // Going stale while locked demotes presence without disturbing the lock,
    // and the deferred release still lands on schedule.
    let harness = TestFleet::new();
    let device = harness.register_device().await;

    harness
        .fleet
        .record_liveness(device.device_token)
        .await
        .unwrap();
    harness
        .fleet
        .emergency_lock(device.id, "334455")
        .await
        .unwrap();

    let stale = Utc::now() + ChronoDuration::minutes(25);
    harness.sweep_job().sweep_at(stale).await.unwrap();

    let swept = harness.store.get(device.id).await.unwrap().unwrap();
    assert_eq!(swept.presence, Presence::Offline);
    assert_eq!(swept.lock_state, LockState::Locked);

    tokio::time::advance(AUTO_UNLOCK_DELAY + Duration::from_secs(1)).await;
    settle().await;

    let released = harness.store.get(device.id).await.unwrap().unwrap();
    assert_eq!(released.lock_state, LockState::Unlocked);
    assert_eq!(released.presence, Presence::Offline);
}

#[tokio::test(start_paused = true)]
async fn test_deletion_during_grace_period_is_quiet() {
    // Deleting a locked device cancels the timer; the audit trail remains.
    let harness = TestFleet::new();
    let device = harness.register_device().await;

    harness
        .fleet
        .emergency_lock(device.id, "778899")
        .await
        .unwrap();
    harness.fleet.delete_device(device.id).await.unwrap();
    assert_eq!(harness.unlock.pending_count(), 0);

    let writes_before = harness.store.device_writes();
    tokio::time::advance(AUTO_UNLOCK_DELAY * 2).await;
    settle().await;
    assert_eq!(harness.store.device_writes(), writes_before);

    let events = harness
        .fleet
        .lock_events(device.id, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(events.total, 1);
}
