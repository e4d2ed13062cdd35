//! Durability tests
//!
//! Tests for recovering the store from its data directory:
//! - Journal replay without a snapshot
//! - Snapshot plus tail replay after the threshold is crossed
//! - Rotation of journaled records into the archive
//! - Falling back to the previous snapshot plus archived records

use std::fs;

use chrono::{Duration, TimeZone, Utc};
use slot_swap::journal::{JournalConfig, LogRotation};
use slot_swap::{
    Event, EventStatus, NewEvent, NewUser, SlotStore, SwapRequest, SwapStatus, User, UserId,
};

struct Dump {
    users: Vec<User>,
    events: Vec<Event>,
    swaps: Vec<SwapRequest>,
}

/// Everything visible through the public API for the given users
fn dump(store: &SlotStore, users: &[UserId]) -> Dump {
    Dump {
        users: users.iter().map(|id| store.get_user(*id).unwrap()).collect(),
        events: users.iter().flat_map(|id| store.list_owned_events(*id)).collect(),
        swaps: users.iter().flat_map(|id| store.list_outgoing(*id)).collect(),
    }
}

fn assert_same(before: &Dump, after: &Dump) {
    assert_eq!(before.users, after.users);
    assert_eq!(before.events, after.events);
    assert_eq!(before.swaps, after.swaps);
}

/// Two users, three swaps: one accepted, one cancelled, one pending
fn populate(store: &SlotStore) -> Vec<UserId> {
    let a = store
        .register_user(NewUser::new("Ann", "ann@example.com", "$2b$04$a"))
        .unwrap()
        .id;
    let b = store
        .register_user(NewUser::new("Ben", "ben@example.com", "$2b$04$b"))
        .unwrap()
        .id;

    let mut slots = Vec::new();
    for (i, owner) in [a, b, a, b, a, b].into_iter().enumerate() {
        let start = Utc.with_ymd_and_hms(2024, 6, 3 + i as u32, 9, 0, 0).unwrap();
        let event = store
            .create_event(
                owner,
                NewEvent::new(format!("slot {i}"), start, start + Duration::hours(1))
                    .with_status(EventStatus::Swappable),
            )
            .unwrap();
        slots.push(event.id);
    }

    let accepted = store.create_swap(a, slots[0], slots[1]).unwrap();
    store.respond_to_swap(accepted.id, b, true).unwrap();

    let cancelled = store.create_swap(b, slots[3], slots[2]).unwrap();
    store.cancel_swap(cancelled.id, b).unwrap();

    store.create_swap(a, slots[4], slots[5]).unwrap();
    vec![a, b]
}

#[test]
fn test_reopen_replays_journal() {
    let dir = tempfile::tempdir().unwrap();
    let config = JournalConfig::new(dir.path());

    let (users, before) = {
        let store = SlotStore::open(config.clone()).unwrap();
        assert!(store.is_durable());
        let users = populate(&store);
        let before = dump(&store, &users);
        (users, before)
    };

    let store = SlotStore::open(config.clone()).unwrap();
    let after = dump(&store, &users);
    assert_same(&before, &after);

    let statuses: Vec<SwapStatus> = after.swaps.iter().map(|s| s.status).collect();
    assert!(statuses.contains(&SwapStatus::Accepted));
    assert!(statuses.contains(&SwapStatus::Cancelled));
    assert!(statuses.contains(&SwapStatus::Pending));

    // Ids continue after the recovered rows
    let next = store
        .register_user(NewUser::new("Cy", "cy@example.com", "$2b$04$c"))
        .unwrap();
    assert_eq!(next.id, UserId(3));
    assert!(matches!(
        store.register_user(NewUser::new("Dup", "ANN@example.com", "$2b$04$d")),
        Err(slot_swap::SwapError::Conflict(_))
    ));
}

#[test]
fn test_snapshot_and_tail_replay() {
    let dir = tempfile::tempdir().unwrap();
    let config = JournalConfig::new(dir.path()).with_snapshot_threshold(5);

    let (users, before) = {
        let store = SlotStore::open(config.clone()).unwrap();
        let users = populate(&store);
        (users.clone(), dump(&store, &users))
    };

    assert!(config.latest_snapshot_path().exists());
    let archives = LogRotation::new(config.clone()).list_archives().unwrap();
    assert!(!archives.is_empty());

    let store = SlotStore::open(config).unwrap();
    assert_same(&before, &dump(&store, &users));
}

#[test]
fn test_forced_snapshot_then_more_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = JournalConfig::new(dir.path());

    let (users, before) = {
        let store = SlotStore::open(config.clone()).unwrap();
        let users = populate(&store);
        store.snapshot().unwrap();

        let pending = store.list_outgoing(users[0]);
        let pending = pending.iter().find(|s| s.is_pending()).unwrap();
        store.respond_to_swap(pending.id, users[1], false).unwrap();
        (users.clone(), dump(&store, &users))
    };

    let store = SlotStore::open(config.clone()).unwrap();
    assert_same(&before, &dump(&store, &users));

    // Only the post-snapshot record is left in the active journal
    let journal = fs::read_to_string(config.journal_path()).unwrap();
    assert_eq!(journal.lines().filter(|l| !l.trim().is_empty()).count(), 1);
}

#[test]
fn test_torn_tail_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = JournalConfig::new(dir.path());

    let (users, before) = {
        let store = SlotStore::open(config.clone()).unwrap();
        let users = populate(&store);
        (users.clone(), dump(&store, &users))
    };

    let mut journal = fs::read_to_string(config.journal_path()).unwrap();
    journal.push_str("{\"seq\": 999, \"ts\": \"2024-");
    fs::write(config.journal_path(), journal).unwrap();

    let store = SlotStore::open(config.clone()).unwrap();
    assert_same(&before, &dump(&store, &users));

    // A write after recovery lands on its own line and survives another restart
    let late = store
        .register_user(NewUser::new("Late", "late@example.com", "$2b$04$l"))
        .unwrap();
    drop(store);

    let store = SlotStore::open(config).unwrap();
    assert_eq!(store.get_user(late.id).unwrap(), late);
}

fn register_numbered(store: &SlotStore, n: u64) -> UserId {
    store
        .register_user(NewUser::new(format!("u{n}"), format!("u{n}@example.com"), "$2b$04$u"))
        .unwrap()
        .id
}

#[test]
fn test_corrupt_latest_snapshot_recovers_from_backup_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let config = JournalConfig::new(dir.path()).with_snapshot_threshold(3);

    let before: Vec<User> = {
        let store = SlotStore::open(config.clone()).unwrap();
        let ids: Vec<UserId> = (1..=7).map(|n| register_numbered(&store, n)).collect();
        ids.iter().map(|id| store.get_user(*id).unwrap()).collect()
    };

    // Two snapshots were taken, so previous.jsonl and the archive both exist
    assert!(config.previous_snapshot_path().exists());
    assert_eq!(LogRotation::new(config.clone()).list_archives().unwrap().len(), 2);

    fs::write(config.latest_snapshot_path(), "garbage\n").unwrap();

    let store = SlotStore::open(config.clone()).unwrap();
    let after: Vec<User> = (1..=7).map(|n| store.get_user(UserId(n)).unwrap()).collect();
    assert_eq!(before, after);

    assert_eq!(register_numbered(&store, 8), UserId(8));
    drop(store);

    let store = SlotStore::open(config).unwrap();
    assert!(store.get_user(UserId(8)).is_ok());
}

#[test]
fn test_missing_latest_snapshot_replays_archive() {
    let dir = tempfile::tempdir().unwrap();
    let config = JournalConfig::new(dir.path()).with_snapshot_threshold(3);

    let (users, before) = {
        let store = SlotStore::open(config.clone()).unwrap();
        let users = populate(&store);
        (users.clone(), dump(&store, &users))
    };

    fs::remove_file(config.latest_snapshot_path()).unwrap();

    let store = SlotStore::open(config).unwrap();
    assert_same(&before, &dump(&store, &users));
}
