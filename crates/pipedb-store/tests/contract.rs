//! Behaviour every block repository backend must share

use pipedb_store::{
    BackendKind, BlockRepository, InputBlock, Key, MemoryRepository, OutputBlock, RedbRepository,
    RepositoryConfig, Return, create_repository,
};
use std::thread;
use tempfile::{TempDir, tempdir};

fn backends() -> Vec<(&'static str, Box<dyn BlockRepository>, TempDir)> {
    let redb_dir = tempdir().unwrap();
    let redb = RedbRepository::new(RepositoryConfig::with_data_dir(redb_dir.path().join("db")));
    let memory: Box<dyn BlockRepository> = Box::new(MemoryRepository::new());
    let redb: Box<dyn BlockRepository> = Box::new(redb);
    vec![
        ("memory", memory, tempdir().unwrap()),
        ("redb", redb, redb_dir),
    ]
}

#[test]
fn closed_repository_refuses_operations() {
    for (name, repo, _dir) in backends() {
        assert!(repo.closed(), "{name}");
        assert!(!repo.opened(), "{name}");

        let mut out = OutputBlock::from(b"untouched".to_vec());
        assert_eq!(repo.put(Key::from("k"), InputBlock::from("v")), Return::NotSupported, "{name}");
        assert_eq!(repo.get(Key::from("k"), &mut out), Return::NotSupported, "{name}");
        assert_eq!(repo.drop_key(Key::from("k")), Return::NotSupported, "{name}");
        assert!(!repo.included(Key::from("k")), "{name}");
        assert!(!repo.excluded(Key::from("k")), "{name}");
        assert_eq!(out.data(), b"untouched", "{name}");

        // closing twice is harmless
        assert_eq!(repo.close(), Return::Ok, "{name}");
        assert!(repo.closed(), "{name}");
    }
}

#[test]
fn put_get_drop_close_erase() {
    for (name, repo, _dir) in backends() {
        assert!(repo.open().success(), "{name}");
        assert!(repo.opened(), "{name}");

        assert_eq!(repo.put(Key::from("key"), InputBlock::from("value")), Return::Ok, "{name}");

        let mut out = OutputBlock::new();
        assert_eq!(repo.get(Key::from("key"), &mut out), Return::Ok, "{name}");
        assert_eq!(out.copy_as_string(), "value", "{name}");

        assert_eq!(repo.drop_key(Key::from("key")), Return::Ok, "{name}");
        assert!(!repo.included(Key::from("key")), "{name}");
        assert!(repo.excluded(Key::from("key")), "{name}");

        assert_eq!(repo.close(), Return::Ok, "{name}");
        assert_eq!(repo.erase(), Return::Ok, "{name}");
    }
}

#[test]
fn open_twice_is_not_supported() {
    for (name, repo, _dir) in backends() {
        assert_eq!(repo.open(), Return::Ok, "{name}");
        assert_eq!(repo.open(), Return::NotSupported, "{name}");
        assert!(repo.opened(), "{name}");
        assert_eq!(repo.erase(), Return::NotSupported, "{name}");
        assert_eq!(repo.close(), Return::Ok, "{name}");
    }
}

#[test]
fn overwrite_reports_existing_key() {
    for (name, repo, _dir) in backends() {
        assert_eq!(repo.open(), Return::Ok, "{name}");
        assert_eq!(repo.put(Key::from("k"), InputBlock::from("one")), Return::Ok, "{name}");

        let status = repo.put(Key::from("k"), InputBlock::from("two"));
        assert_eq!(status, Return::KeyHeretoforeIncluded, "{name}");
        assert!(!status.success() && status.key_is_present(), "{name}");

        let mut out = OutputBlock::new();
        assert_eq!(repo.get(Key::from("k"), &mut out), Return::Ok, "{name}");
        assert_eq!(out.data(), b"two", "{name}");
    }
}

#[test]
fn missing_key_leaves_output_untouched() {
    for (name, repo, _dir) in backends() {
        assert_eq!(repo.open(), Return::Ok, "{name}");
        let mut out = OutputBlock::from(b"previous".to_vec());

        let status = repo.get(Key::from("absent"), &mut out);
        assert_eq!(status, Return::KeyNotPresent, "{name}");
        assert!(status.key_not_present(), "{name}");
        assert_eq!(out.data(), b"previous", "{name}");

        // dropping an absent key succeeds
        assert_eq!(repo.drop_key(Key::from("absent")), Return::Ok, "{name}");
    }
}

#[test]
fn erase_of_never_created_store_succeeds() {
    for (name, repo, _dir) in backends() {
        assert_eq!(repo.erase(), Return::Ok, "{name}");
    }
}

#[test]
fn concurrent_writers_and_readers() {
    for (name, repo, _dir) in backends() {
        assert_eq!(repo.open(), Return::Ok, "{name}");
        let repo = repo.as_ref();
        thread::scope(|s| {
            for t in 0..4u32 {
                s.spawn(move || {
                    for i in 0..50u32 {
                        let key = format!("{t}-{i}");
                        let value = i.to_be_bytes();
                        assert!(repo.put(Key::from(&key), InputBlock::from(&value)).success());
                        let mut out = OutputBlock::new();
                        assert_eq!(repo.get(Key::from(&key), &mut out), Return::Ok);
                        assert_eq!(out.data(), &value);
                    }
                });
            }
        });
        for t in 0..4u32 {
            assert!(repo.included(Key::from(&format!("{t}-49"))), "{name}");
        }
        assert_eq!(repo.close(), Return::Ok, "{name}");
    }
}

#[test]
fn factory_builds_each_kind() {
    let dir = tempdir().unwrap();
    for kind in [BackendKind::Memory, BackendKind::Redb] {
        let config = RepositoryConfig::with_data_dir(dir.path().join(kind.as_str()));
        let repo = create_repository(kind, config);
        assert_eq!(repo.open(), Return::Ok, "{kind}");
        assert_eq!(repo.put(Key::from("k"), InputBlock::from("v")), Return::Ok, "{kind}");
        assert_eq!(repo.close(), Return::Ok, "{kind}");
    }
}
