// ABOUTME: Tests for the single-attempt deploy lock.
// ABOUTME: Atomic acquisition, held/stale/forced lock handling, release.

use chrono::Utc;
use relevo::deploy::{DeployError, DeployLock, LockInfo};
use relevo::types::ServiceName;

#[test]
fn acquire_creates_lock_file_and_release_removes_it() {
    let dir = tempfile::tempdir().unwrap();
    let service = ServiceName::new("myapp").unwrap();

    let lock = DeployLock::acquire(dir.path(), &service, false).unwrap();
    let path = dir.path().join("myapp.lock");
    assert!(path.exists());

    let info: LockInfo =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(info.service, "myapp");
    assert_eq!(info.pid, std::process::id());

    lock.release();
    assert!(!path.exists());
}

#[test]
fn second_acquisition_reports_the_holder() {
    let dir = tempfile::tempdir().unwrap();
    let service = ServiceName::new("myapp").unwrap();

    let _held = DeployLock::acquire(dir.path(), &service, false).unwrap();
    let err = DeployLock::acquire(dir.path(), &service, false).unwrap_err();
    match err {
        DeployError::LockHeld { pid, .. } => assert_eq!(pid, std::process::id()),
        other => panic!("expected LockHeld, got {other:?}"),
    }
}

#[test]
fn force_breaks_a_live_lock() {
    let dir = tempfile::tempdir().unwrap();
    let service = ServiceName::new("myapp").unwrap();

    let _held = DeployLock::acquire(dir.path(), &service, false).unwrap();
    let lock = DeployLock::acquire(dir.path(), &service, true).unwrap();
    lock.release();
}

#[test]
fn stale_lock_is_auto_broken() {
    let dir = tempfile::tempdir().unwrap();
    let service = ServiceName::new("myapp").unwrap();
    let path = dir.path().join("myapp.lock");

    let mut info = LockInfo::new(&service);
    info.started_at = Utc::now() - chrono::Duration::hours(2);
    std::fs::write(&path, serde_json::to_string(&info).unwrap()).unwrap();

    let lock = DeployLock::acquire(dir.path(), &service, false).unwrap();
    lock.release();
}

#[test]
fn corrupted_lock_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let service = ServiceName::new("myapp").unwrap();
    std::fs::write(dir.path().join("myapp.lock"), "not json").unwrap();

    let lock = DeployLock::acquire(dir.path(), &service, false).unwrap();
    lock.release();
}

#[test]
fn dropping_an_unreleased_lock_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let service = ServiceName::new("myapp").unwrap();
    let path = dir.path().join("myapp.lock");

    {
        let _lock = DeployLock::acquire(dir.path(), &service, false).unwrap();
        assert!(path.exists());
    }
    assert!(!path.exists());
}
