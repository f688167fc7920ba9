// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{QueueConfig, LOCK_REAP_AGE};
use crate::queue::STATUS_UPDATE;
use crate::worker::FakeWorker;
use spool_core::test_support::new_item;
use spool_core::{FakeClock, ItemId, SystemClock};
use spool_storage::Backup;
use tempfile::{tempdir, TempDir};

fn queue() -> (TempDir, Queue<FakeClock, FakeWorker>, FakeClock) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let config = QueueConfig::new(dir.path()).acquire_timeout(Duration::from_millis(100));
    let queue = Queue::with_parts(config, clock.clone(), FakeWorker::default()).unwrap();
    (dir, queue, clock)
}

/// Simulate a crash after the move landed but before the commit.
fn crash_mid_move(queue: &Queue<FakeClock, FakeWorker>, id: &ItemId, target: Status) {
    let item = queue.load(id).unwrap();
    let backup = Backup { previous_status: item.status, target_status: target, previous_item: item };
    queue.transactions().begin(id, STATUS_UPDATE, backup).unwrap();
    queue.store().move_to(id, target, None).unwrap();
}

#[test]
fn cleanup_expired_locks_spares_fresh_ones() {
    let (_dir, queue, clock) = queue();
    let old = ItemId::from("itm-old");
    let fresh = ItemId::from("itm-fresh");
    queue.locks().acquire(&old, Duration::ZERO).unwrap().unwrap();
    clock.advance(Duration::from_secs(61));
    queue.locks().acquire(&fresh, Duration::ZERO).unwrap().unwrap();

    assert_eq!(queue.cleanup_expired_locks(Duration::from_secs(60)).unwrap(), 1);
    assert!(queue.locks().is_locked(&fresh).unwrap());
    assert!(queue.locks().holder(&old).unwrap().is_none());
}

#[test]
fn cleanup_expired_transactions_uses_its_own_threshold() {
    let (_dir, queue, clock) = queue();
    let id = queue.create(new_item("job")).unwrap();
    crash_mid_move(&queue, &id, Status::Processing);
    clock.advance(Duration::from_secs(120));

    // Old enough for the lock janitor, not for the transaction janitor
    assert_eq!(queue.cleanup_expired_transactions(Duration::from_secs(300)).unwrap(), 0);
    clock.advance(Duration::from_secs(180));
    assert_eq!(queue.cleanup_expired_transactions(Duration::from_secs(300)).unwrap(), 1);
    assert!(queue.transactions().list().unwrap().is_empty());
}

#[test]
fn reap_uses_configured_ages() {
    let (_dir, queue, clock) = queue();
    let id = queue.create(new_item("job")).unwrap();
    queue.locks().acquire(&id, Duration::ZERO).unwrap().unwrap();
    crash_mid_move(&queue, &id, Status::Processing);

    clock.advance(LOCK_REAP_AGE);
    assert_eq!(queue.reap().unwrap(), ReapReport { locks: 1, transactions: 0 });

    clock.advance(Duration::from_secs(300));
    assert_eq!(queue.reap().unwrap(), ReapReport { locks: 0, transactions: 1 });
}

#[test]
fn cleanup_older_than_prunes_terminal_items() {
    let (_dir, queue, clock) = queue();
    let done = queue.create(new_item("done")).unwrap();
    queue.store().move_to(&done, Status::Completed, None).unwrap();
    clock.advance(Duration::from_secs(7200));

    assert_eq!(queue.cleanup_older_than(Status::Completed, Duration::from_secs(3600)).unwrap(), 1);
    assert!(matches!(queue.load(&done).unwrap_err(), QueueError::NotFound(_)));
}

#[test]
fn recover_rolls_back_interrupted_move() {
    let (_dir, queue, clock) = queue();
    let id = queue.create(new_item("job")).unwrap();
    let before = queue.load(&id).unwrap();
    crash_mid_move(&queue, &id, Status::Processing);
    clock.advance(queue.config().lock_ttl);

    let report = queue.recover_orphans().unwrap();

    assert_eq!(report, RecoveryReport { rolled_back: 1, ..Default::default() });
    assert_eq!(queue.load(&id).unwrap(), before);
    assert!(!queue.store().partition_contains(Status::Processing, id.as_str()));
    assert!(queue.transactions().list().unwrap().is_empty());
    assert!(!queue.locks().is_locked(&id).unwrap());
}

#[test]
fn recover_leaves_young_transactions() {
    let (_dir, queue, _clock) = queue();
    let id = queue.create(new_item("job")).unwrap();
    crash_mid_move(&queue, &id, Status::Processing);

    assert_eq!(queue.recover_orphans().unwrap(), RecoveryReport::default());
    assert_eq!(queue.transactions().list().unwrap().len(), 1);
}

#[test]
fn recover_skips_locked_items() {
    let (_dir, queue, clock) = queue();
    let id = queue.create(new_item("job")).unwrap();
    crash_mid_move(&queue, &id, Status::Processing);
    clock.advance(queue.config().lock_ttl);
    queue.locks().acquire(&id, Duration::ZERO).unwrap().unwrap();

    let report = queue.recover_orphans().unwrap();

    assert_eq!(report.skipped_locked, 1);
    assert_eq!(queue.load(&id).unwrap().status, Status::Processing);
}

#[test]
fn recover_drops_overtaken_transactions() {
    let (_dir, queue, clock) = queue();
    let id = queue.create(new_item("job")).unwrap();
    crash_mid_move(&queue, &id, Status::Processing);
    queue.store().move_to(&id, Status::Completed, None).unwrap();
    clock.advance(queue.config().lock_ttl);

    let report = queue.recover_orphans().unwrap();

    assert_eq!(report.superseded, 1);
    assert_eq!(queue.load(&id).unwrap().status, Status::Completed);
    assert!(queue.transactions().list().unwrap().is_empty());
}

#[test]
fn recover_counts_unreadable_records() {
    let (_dir, queue, clock) = queue();
    let path = queue.config().layout.transactions_dir().join("txn-garbage.json");
    std::fs::write(path, b"not json").unwrap();
    // Unreadable records are aged by mtime, which is wall-clock time
    clock.set_epoch_ms(SystemClock.epoch_ms() + 3_600_000);

    assert_eq!(queue.recover_orphans().unwrap().unreadable, 1);
}

#[test]
fn rebuild_index_is_exposed() {
    let (dir, queue, _clock) = queue();
    queue.create(new_item("job")).unwrap();
    std::fs::remove_file(dir.path().join("index.json")).unwrap();

    assert_eq!(queue.rebuild_index().unwrap().indexed, 1);
    assert_eq!(queue.stats().unwrap().pending, 1);
}
