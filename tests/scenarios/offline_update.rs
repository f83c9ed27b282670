//! Scenario: Offline Update From a USB Stick
//!
//! Journey: A technician plugs in a delta package and applies it without
//! network access.
//!
//! Success Criteria:
//! - An older package is rejected before anything is locked or changed
//! - A newer package is applied, the branch advanced, the result deployed
//! - A corrupt package is rejected before anything is locked

use crate::common::*;
use otactl::{Completion, OtaError, Request};
use tempfile::tempdir;

fn mutating_commands(world: &World) -> Vec<String> {
    world
        .commands()
        .into_iter()
        .filter(|c| c.contains("apply-offline") || c.contains(" reset "))
        .collect()
}

#[test]
fn scenario_downgrade_is_rejected_without_side_effects() {
    let dir = tempdir().unwrap();
    let package = write_package(dir.path(), 90, 0xcd);
    let world = World::with_deployments(&["aaa"]);
    world.set_head("aaa", 100);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let done = orchestrator.handle(Request::ApplyOffline(package), &sink);

    match done {
        Completion::OfflineApplied(Err(OtaError::DowngradeRejected { current, package })) => {
            assert_eq!(current, 100);
            assert_eq!(package, 90);
        }
        other => panic!("expected a rejected downgrade, got {:?}", other),
    }
    assert_eq!(
        sink.errors(),
        ["Not allowed to downgrade - current timestamp: 100, package timestamp: 90"]
    );
    assert!(mutating_commands(&world).is_empty());
    let state = world.state();
    assert!(state.deploys.is_empty());
    assert_eq!(state.lock_count, 0);
    assert_eq!(state.head.as_deref(), Some("aaa"));
}

#[test]
fn scenario_newer_package_is_applied_then_deployed() {
    let dir = tempdir().unwrap();
    let package = write_package(dir.path(), 120, 0xcd);
    let target = checksum_of(0xcd);
    let world = World::with_deployments(&["aaa"]);
    world.set_head("aaa", 100);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let revision = orchestrator.apply_offline(&package, &sink).unwrap();

    assert_eq!(revision.as_str(), target);
    let steps = mutating_commands(&world);
    assert_eq!(steps.len(), 2);
    assert!(steps[0].starts_with("ostree static-delta apply-offline "));
    assert_eq!(steps[1], format!("ostree reset qt-os:linux/qt {}", target));

    assert_eq!(world.state().deploys, [target.clone()]);
    assert_eq!(world.disk_revisions(), [target.clone(), "aaa".to_string()]);
    assert_eq!(world.state().head.as_deref(), Some(target.as_str()));
    assert_eq!(sink.rollback_changes()[0].revision.as_str(), "aaa");
    assert!(sink
        .statuses()
        .contains(&"Applying the update package...".to_string()));
    assert!(!world.is_locked());
}

#[test]
fn scenario_same_timestamp_is_not_a_downgrade() {
    let dir = tempdir().unwrap();
    let package = write_package(dir.path(), 100, 0xef);
    let world = World::with_deployments(&["aaa"]);
    world.set_head("aaa", 100);
    let orchestrator = orchestrator(&world);

    let done = orchestrator.handle(Request::ApplyOffline(package), &RecordingSink::default());
    assert!(done.is_ok(), "{:?}", done.error());
}

#[test]
fn scenario_corrupt_package_is_rejected_before_locking() {
    let dir = tempdir().unwrap();
    let package = dir.path().join("broken.delta");
    std::fs::write(&package, b"\x00\x01 not a superblock").unwrap();
    let world = World::with_deployments(&["aaa"]);
    world.set_head("aaa", 100);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let done = orchestrator.handle(Request::ApplyOffline(package), &sink);

    assert!(matches!(done.error(), Some(OtaError::MalformedDelta { .. })));
    assert_eq!(sink.errors().len(), 1);
    assert!(world.commands().is_empty());
    assert_eq!(world.state().lock_count, 0);
}

#[test]
fn scenario_failed_apply_releases_lock_and_skips_deploy() {
    let dir = tempdir().unwrap();
    let package = write_package(dir.path(), 120, 0xcd);
    let world = World::with_deployments(&["aaa"]);
    world.set_head("aaa", 100);
    world.fail_command("ostree static-delta", "Missing object");
    let orchestrator = orchestrator(&world);

    let done = orchestrator.handle(Request::ApplyOffline(package), &RecordingSink::default());

    assert!(matches!(done.error(), Some(OtaError::CommandRuntime { .. })));
    assert!(world.state().deploys.is_empty());
    assert_eq!(world.state().head.as_deref(), Some("aaa"));
    assert!(!world.is_locked());
}
