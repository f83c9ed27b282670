//! Scenario: Two Updaters on One Device
//!
//! Journey: A second otactl process starts while the first one holds the
//! sysroot lock.
//!
//! Success Criteria:
//! - The second one waits until the first releases
//! - It then gets the lock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use otactl::application::LockManager;
use otactl::config::OtaConfig;
use otactl::infrastructure::{FileSysroot, ProcessExecutor};
use tempfile::tempdir;

fn sysroot(root: &std::path::Path) -> FileSysroot<ProcessExecutor> {
    let config = OtaConfig::default();
    FileSysroot::new(root, ProcessExecutor, config.ostree_commands())
}

#[test]
fn scenario_second_updater_waits_for_lock() {
    let dir = tempdir().unwrap();
    let first = sysroot(dir.path());
    let mut held = LockManager::new(&first).acquire("rollback").unwrap();

    let acquired = Arc::new(AtomicBool::new(false));
    let root = dir.path().to_path_buf();
    let flag = Arc::clone(&acquired);
    let waiter = thread::spawn(move || {
        let second = sysroot(&root);
        let _lock = LockManager::new(&second).acquire("update").unwrap();
        flag.store(true, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(200));
    assert!(!acquired.load(Ordering::SeqCst));

    held.release();
    waiter.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}
