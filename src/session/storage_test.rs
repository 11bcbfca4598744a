use super::*;

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("token").expect("get"), None);

    storage.set("token", "abc").expect("set");
    assert_eq!(storage.get("token").expect("get").as_deref(), Some("abc"));

    storage.remove("token").expect("remove");
    assert_eq!(storage.get("token").expect("get"), None);
    storage.remove("token").expect("removing twice is fine");
}

#[test]
fn memory_storage_with_entry_is_preseeded() {
    let storage = MemoryStorage::with_entry("token", "seed");
    assert_eq!(storage.get("token").expect("get").as_deref(), Some("seed"));
}

#[test]
fn file_storage_missing_file_reads_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FileStorage::new(dir.path().join("nested").join("session.json"));
    assert_eq!(storage.get("token").expect("get"), None);
    storage.remove("token").expect("remove on missing file");
    assert!(!storage.path().exists());
}

#[test]
fn file_storage_persists_across_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");

    FileStorage::new(&path).set("token", "abc.def").expect("set");
    FileStorage::new(&path).set("other", "keep").expect("set other");

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get("token").expect("get").as_deref(), Some("abc.def"));

    reopened.remove("token").expect("remove");
    assert_eq!(FileStorage::new(&path).get("token").expect("get"), None);
    assert_eq!(FileStorage::new(&path).get("other").expect("get").as_deref(), Some("keep"));
}

#[test]
fn file_storage_rejects_corrupt_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").expect("write");

    let err = FileStorage::new(&path).get("token").unwrap_err();
    assert!(matches!(err, StorageError::Json(_)));
}

#[test]
fn file_storage_set_replaces_corrupt_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").expect("write");

    let storage = FileStorage::new(&path);
    storage.set("token", "fresh").expect("set over corrupt file");
    assert_eq!(storage.get("token").expect("get").as_deref(), Some("fresh"));
}

#[test]
fn file_storage_remove_clears_corrupt_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").expect("write");

    let storage = FileStorage::new(&path);
    storage.remove("token").expect("remove over corrupt file");
    assert_eq!(storage.get("token").expect("get"), None);
}

#[cfg(unix)]
#[test]
fn file_storage_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    FileStorage::new(&path).set("token", "secret").expect("set");

    let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
