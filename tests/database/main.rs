//! Integration tests for the Database façade over the in-memory and file stores.

#[path = "../support/mod.rs"]
mod support;

use proptest::prelude::*;
use record_store::{
    Database, DataStore, FileStore, LocalDatabase, LoggingDatabase, Model, Persistable, Query,
    ReadError, Store, StoreConfig, WriteError,
};
use support::users::{AuditEntry, User, UserRecord};
use support::{memory_db, memory_db_with, WAIT};

#[test]
fn write_then_read_returns_equal_value() {
    let db = memory_db();
    let alice = User::new("u-1", "Alice", 30).with_email("alice@example.com");

    db.write(&alice, "u-1").unwrap();

    let loaded: User = db.read("u-1").unwrap();
    assert_eq!(loaded, alice);
}

#[test]
fn writing_twice_is_idempotent() {
    let db = memory_db();
    let alice = User::new("u-1", "Alice", 30);

    db.write(&alice, "u-1").unwrap();
    db.write(&alice, "u-1").unwrap();

    let all = db.data().query_models::<User>(&Query::all()).unwrap();
    assert_eq!(all, vec![alice]);
}

#[test]
fn write_replaces_existing_value() {
    let db = memory_db();
    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();
    db.write(&User::new("u-1", "Alice", 31), "u-1").unwrap();

    assert_eq!(db.read::<User>("u-1").unwrap().age, 31);
}

#[test]
fn delete_of_missing_id_is_not_an_error() {
    let db = memory_db();
    assert_eq!(db.delete::<User>("ghost"), Ok(false));

    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();
    assert_eq!(db.delete::<User>("u-1"), Ok(true));
    assert_eq!(db.delete::<User>("u-1"), Ok(false));
}

#[test]
fn read_of_missing_id_is_not_found() {
    let db = memory_db();
    let err = db.read::<User>("ghost").unwrap_err();
    assert_eq!(
        err,
        ReadError::NotFound {
            collection: "users".into(),
            id: "ghost".into(),
        }
    );
}

#[test]
fn write_under_a_different_id_is_rejected() {
    let db = memory_db();
    let err = db.write(&User::new("u-1", "Alice", 30), "u-2").unwrap_err();
    assert_eq!(
        err,
        WriteError::IdMismatch {
            requested: "u-2".into(),
            record: "u-1".into(),
        }
    );

    // Nothing was stored under either id
    assert!(db.read::<User>("u-1").is_err());
    assert!(db.read::<User>("u-2").is_err());
}

#[test]
fn derived_persistable_uses_configured_names() {
    assert_eq!(UserRecord::COLLECTION, "users");
    assert_eq!(AuditEntry::COLLECTION, "audit_entrys");

    let record = UserRecord {
        user_id: "u-9".into(),
        name: "Zed".into(),
        age: 40,
        email: None,
    };
    assert_eq!(record.id(), "u-9");
}

#[test]
fn unregistered_collection_is_a_constraint_violation() {
    let db = memory_db_with(StoreConfig::in_memory().register::<UserRecord>());

    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();

    let entry = AuditEntry {
        id: "a-1".into(),
        message: "hello".into(),
    };
    let err = db.data().try_write(&entry).unwrap_err();
    assert!(matches!(err, WriteError::Constraint(_)));
    assert!(!db.data().write(&entry));
}

#[test]
fn reading_an_unregistered_collection_is_not_an_open_failure() {
    let db = memory_db_with(StoreConfig::in_memory().register::<UserRecord>());

    assert!(db.data().can_read());
    let unknown = ReadError::UnknownCollection(AuditEntry::COLLECTION.into());
    assert_eq!(db.data().read::<AuditEntry>("a-1"), Err(unknown.clone()));
    assert_eq!(db.data().query::<AuditEntry>(&Query::all()), Err(unknown));

    // Registered collections still read normally
    assert!(matches!(
        db.read::<User>("u-1"),
        Err(ReadError::NotFound { .. })
    ));
}

#[test]
fn records_without_models_use_the_adapter_directly() {
    let db = memory_db();
    let entry = AuditEntry {
        id: "a-1".into(),
        message: "signed in".into(),
    };

    assert!(db.data().write(&entry));
    assert_eq!(db.data().read::<AuditEntry>("a-1").unwrap(), Some(entry));
    assert!(db.data().delete::<AuditEntry>("a-1"));
    assert_eq!(db.data().read::<AuditEntry>("a-1").unwrap(), None);
}

#[test]
fn collections_are_isolated() {
    let db = memory_db();
    db.write(&User::new("shared", "Alice", 30), "shared").unwrap();

    assert_eq!(db.data().read::<AuditEntry>("shared").unwrap(), None);
    assert!(!db.data().delete::<AuditEntry>("shared"));
    assert!(db.read::<User>("shared").is_ok());
}

#[test]
fn logging_wrapper_is_transparent() {
    let db = LoggingDatabase::new(memory_db());
    let bob = User::new("u-2", "Bob", 25);

    assert!(db.write_read(&bob, "u-2"));
    assert_eq!(db.read::<User>("u-2").unwrap(), bob);
    assert_eq!(db.delete::<User>("u-2"), Ok(true));
    assert!(matches!(
        db.read::<User>("u-2"),
        Err(ReadError::NotFound { .. })
    ));

    let live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));
}

#[test]
fn unavailable_store_reports_capability_errors() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::at(dir.path().join("missing").join("store.bin"));
    let db = LocalDatabase::new(DataStore::<FileStore>::file(config).unwrap());

    assert!(!db.data().can_read());
    assert_eq!(db.read::<User>("u-1"), Err(ReadError::NotReadable));
    assert_eq!(
        db.write(&User::new("u-1", "Alice", 30), "u-1"),
        Err(WriteError::NotWritable)
    );
    assert_eq!(db.delete::<User>("u-1"), Err(WriteError::NotWritable));
    assert!(!db.write_read(&User::new("u-1", "Alice", 30), "u-1"));

    let live = db.objects::<User>();
    assert_eq!(live.recv_timeout(WAIT), Some(Ok(vec![])));
    assert_eq!(live.recv_timeout(WAIT), None);
}

#[test]
fn closed_store_fails_boolean_contract() {
    let db = memory_db();
    db.write(&User::new("u-1", "Alice", 30), "u-1").unwrap();
    db.data().store().close();

    assert!(!db.data().write(&User::new("u-2", "Bob", 25).to_record()));
    assert!(!db.data().delete::<UserRecord>("u-1"));
    assert_eq!(
        db.data().query::<UserRecord>(&Query::all()),
        Err(ReadError::NotReadable)
    );
}

proptest! {
    #[test]
    fn write_read_law_holds(
        id in "[a-z0-9-]{1,12}",
        name in "\\PC{0,16}",
        age in 0u32..130,
        email in proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
    ) {
        let db = memory_db();
        let user = User { id: id.clone(), name, age, email };

        prop_assert!(db.write_read(&user, &id));
        prop_assert_eq!(db.read::<User>(&id).unwrap(), user);
    }
}
