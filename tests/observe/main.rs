//! Integration tests for live query subscriptions.

#[path = "../support/mod.rs"]
mod support;

use std::thread;

use record_store::{Database, Emission, Query, Subscription};
use support::users::{AuditEntry, User, UserRecord};
use support::{memory_db, QUIET, WAIT};

/// Receive until a snapshot satisfies `done`, returning it.
///
/// Change signals are coalesced, so intermediate snapshots may be skipped.
fn wait_for<F>(sub: &Subscription<User>, done: F) -> Vec<User>
where
    F: Fn(&[User]) -> bool,
{
    loop {
        match sub.recv_timeout(WAIT) {
            Some(Ok(users)) if done(&users) => return users,
            Some(Ok(_)) => continue,
            Some(Err(err)) => panic!("subscription failed: {}", err),
            None => panic!("subscription ended before the expected snapshot"),
        }
    }
}

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.name.as_str()).collect()
}

#[test]
fn emits_empty_snapshot_then_inserted_record() {
    let db = memory_db();
    let live = db.objects::<User>();

    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    let alice = User::new("u-1", "Alice", 30);
    db.write(&alice, "u-1").unwrap();

    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![alice])));
}

#[test]
fn initial_snapshot_reflects_existing_records() {
    let db = memory_db();
    db.write(&User::new("u-2", "Bob", 25), "u-2").unwrap();
    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();

    let live = db.objects::<User>();
    let first = live.recv_timeout(WAIT).unwrap().unwrap();

    // Natural order is ascending id
    assert_eq!(names(&first), vec!["Alice", "Bob"]);
}

#[test]
fn updates_and_deletes_are_emitted() {
    let db = memory_db();
    let live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();
    wait_for(&live, |users| users.len() == 1);

    db.write(&User::new("u-1", "Alice", 31), "u-1").unwrap();
    wait_for(&live, |users| users.first().map(|u| u.age) == Some(31));

    db.delete::<User>("u-1").unwrap();
    wait_for(&live, |users| users.is_empty());
}

#[test]
fn filtered_sorted_query_stays_current() {
    let db = memory_db();
    let query = Query::<UserRecord>::all()
        .filter(|r| r.age >= 18)
        .sorted_by("name", true);
    let live = db.objects_matching::<User>(query);
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    db.write(&User::new("u-1", "Carol", 40), "u-1").unwrap();
    db.write(&User::new("u-2", "Dan", 12), "u-2").unwrap();
    db.write(&User::new("u-3", "Alice", 30), "u-3").unwrap();

    let adults = wait_for(&live, |users| users.len() == 2);
    assert_eq!(names(&adults), vec!["Alice", "Carol"]);

    // Dan comes of age
    db.write(&User::new("u-2", "Dan", 18), "u-2").unwrap();
    let adults = wait_for(&live, |users| users.len() == 3);
    assert_eq!(names(&adults), vec!["Alice", "Carol", "Dan"]);
}

#[test]
fn secondary_sort_key_breaks_ties() {
    let db = memory_db();
    db.write(&User::new("u-1", "Bob", 30), "u-1").unwrap();
    db.write(&User::new("u-2", "Alice", 30), "u-2").unwrap();
    db.write(&User::new("u-3", "Carol", 25), "u-3").unwrap();

    let query = Query::<UserRecord>::all()
        .sorted_by("age", false)
        .then_sorted_by("name", true);
    let live = db.objects_matching::<User>(query);

    let users = live.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(names(&users), vec!["Alice", "Bob", "Carol"]);
}

#[test]
fn nothing_is_delivered_after_cancel() {
    let db = memory_db();
    let live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    live.cancel();

    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();
    db.delete::<User>("u-1").unwrap();

    assert_eq!(live.recv_timeout(QUIET), None);
    assert_eq!(live.try_recv(), None);
    assert!(live.is_cancelled());
    assert_eq!(db.data().store().watch_count(), 0);
}

#[test]
fn cancel_handle_unblocks_a_waiting_consumer() {
    let db = memory_db();
    let mut live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    let handle = live.cancel_handle();
    let canceller = thread::spawn(move || {
        thread::sleep(QUIET);
        handle.cancel();
    });

    // Blocks until the cancel lands, then the iterator ends
    let rest: Vec<Emission<User>> = live.by_ref().collect();
    canceller.join().unwrap();

    assert!(rest.is_empty());
    assert!(live.is_cancelled());
}

#[test]
fn subscriptions_are_independent() {
    let db = memory_db();
    let first = db.objects::<User>();
    let second = db.objects::<User>();
    assert_eq!(first.recv_timeout(WAIT), Some(Ok(vec![])));
    assert_eq!(second.recv_timeout(WAIT), Some(Ok(vec![])));

    first.cancel();
    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();

    assert_eq!(first.recv_timeout(QUIET), None);
    assert_eq!(
        second.recv_timeout(WAIT),
        Some(Ok(vec![User::new("u-1", "Alice", 30)]))
    );
    assert_eq!(db.data().store().watch_count(), 1);
}

#[test]
fn other_collections_do_not_wake_the_subscription() {
    let db = memory_db();
    let live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    let entry = AuditEntry {
        id: "a-1".into(),
        message: "unrelated".into(),
    };
    assert!(db.data().write(&entry));

    assert_eq!(live.recv_timeout(QUIET), None);
    assert!(!live.is_cancelled());
}

#[test]
fn dropping_the_subscription_releases_its_watch() {
    let db = memory_db();
    {
        let live = db.objects::<User>();
        assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));
        assert_eq!(db.data().store().watch_count(), 1);
    }
    assert_eq!(db.data().store().watch_count(), 0);

    // Writes after the drop still succeed
    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();
}

#[test]
fn concurrent_writers_converge_on_final_state() {
    let db = memory_db();
    let live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));

    let writers: Vec<_> = (0..4)
        .map(|n| {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..5 {
                    let id = format!("u-{}-{}", n, i);
                    db.write(&User::new(&id, "writer", n), &id).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let all = wait_for(&live, |users| users.len() == 20);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));
}
