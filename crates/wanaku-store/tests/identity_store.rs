use std::fs;

use wanaku_core::{ServiceTarget, ServiceType, WanakuError};
use wanaku_store::{FileHeader, InstanceIdentityStore};

const FIRST_ID: &str = "11111111-1111-1111-1111-111111111111";

fn target(id: &str) -> ServiceTarget {
    ServiceTarget::new("camel", "localhost", 9190, ServiceType::ToolInvoker).with_id(id)
}

#[test]
fn fresh_dir_round_trip_is_sixty_bytes() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!InstanceIdentityStore::exists_in(dir.path(), "camel"));

    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    store.write(&target(FIRST_ID)).unwrap();

    assert!(InstanceIdentityStore::exists_in(dir.path(), "camel"));
    assert_eq!(store.path(), dir.path().join("camel.wanaku.dat"));
    assert_eq!(fs::metadata(store.path()).unwrap().len(), 60);
    assert_eq!(store.read().unwrap().unwrap().id(), FIRST_ID);
    assert_eq!(
        store.read_header().unwrap(),
        Some(FileHeader::new(ServiceType::ToolInvoker))
    );
}

#[test]
fn first_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();

    store.write(&target(FIRST_ID)).unwrap();
    let second = uuid::Uuid::new_v4().to_string();
    store.write(&target(&second)).unwrap();

    assert_eq!(store.read().unwrap().unwrap().id(), FIRST_ID);
    assert_eq!(fs::metadata(store.path()).unwrap().len(), 60);
}

#[test]
fn random_ids_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    for n in 0..8 {
        let name = format!("svc-{n}");
        let id = uuid::Uuid::new_v4().to_string();
        let store = InstanceIdentityStore::new(dir.path(), &name).unwrap();
        store.write(&target(&id)).unwrap();
        assert_eq!(store.read().unwrap().unwrap().into_id(), id);
    }
}

#[test]
fn missing_file_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "ghost").unwrap();
    assert!(!store.exists());
    assert!(store.read().unwrap().is_none());
}

#[test]
fn creates_missing_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = InstanceIdentityStore::new(&nested, "camel").unwrap();
    store.write(&target(FIRST_ID)).unwrap();
    assert!(store.exists());
}

#[test]
fn rejects_ids_that_are_not_36_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();

    let err = store.write(&target("not-a-uuid")).unwrap_err();
    assert!(matches!(err, WanakuError::InvalidArgument(_)));
    assert!(!store.exists());
}

#[test]
fn rejects_target_without_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    let anonymous = ServiceTarget::new("camel", "localhost", 9190, ServiceType::ToolInvoker);
    assert!(store.write(&anonymous).is_err());
    assert!(!store.exists());
}

#[test]
fn corrupt_header_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    fs::write(store.path(), b"garbage garbage garbage garbage").unwrap();

    let err = store.read().unwrap_err();
    assert!(matches!(err, WanakuError::CorruptIdentityFile { .. }));
}

#[test]
fn header_only_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    fs::write(store.path(), FileHeader::new(ServiceType::ResourceProvider).encode()).unwrap();

    assert!(matches!(
        store.read().unwrap_err(),
        WanakuError::CorruptIdentityFile { .. }
    ));
}

#[test]
fn write_over_partial_file_reports_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    fs::write(store.path(), FileHeader::new(ServiceType::ToolInvoker).encode()).unwrap();

    let err = store.write(&target(FIRST_ID)).unwrap_err();
    assert!(matches!(err, WanakuError::CorruptIdentityFile { .. }));
    assert_eq!(fs::metadata(store.path()).unwrap().len(), 20);
}

#[test]
fn empty_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    fs::write(store.path(), b"").unwrap();

    assert!(matches!(
        store.read().unwrap_err(),
        WanakuError::CorruptIdentityFile { .. }
    ));
}

#[test]
fn truncated_entry_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    store.write(&target(FIRST_ID)).unwrap();

    let bytes = fs::read(store.path()).unwrap();
    fs::write(store.path(), &bytes[..58]).unwrap();

    assert!(matches!(
        store.read().unwrap_err(),
        WanakuError::CorruptIdentityFile { .. }
    ));
}

#[test]
fn write_leaves_only_the_identity_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = InstanceIdentityStore::new(dir.path(), "camel").unwrap();
    store.write(&target(FIRST_ID)).unwrap();
    store.write(&target(&uuid::Uuid::new_v4().to_string())).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec!["camel.wanaku.dat"]);
}

#[test]
fn service_names_must_stay_inside_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["", ".", "..", "../camel", "a/b", "/etc/camel", "a\\b"] {
        let err = InstanceIdentityStore::new(dir.path(), name).unwrap_err();
        assert!(matches!(err, WanakuError::InvalidArgument(_)), "{name:?}");
        assert!(!InstanceIdentityStore::exists_in(dir.path(), name));
    }
    assert!(InstanceIdentityStore::new(dir.path(), "camel-core.v2").is_ok());
}
