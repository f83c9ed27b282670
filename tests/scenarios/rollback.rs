//! Scenario: Rolling Back
//!
//! Journey: A device has two deployments; the operator switches between
//! them and expects the list to flip each time.
//!
//! Success Criteria:
//! - [A, B] becomes [B, A], then [A, B] again
//! - The rollback target is reported after each switch
//! - A device with one deployment refuses cleanly and stays unlocked

use crate::common::*;
use otactl::{Completion, OtaError, Request};

#[test]
fn scenario_rollback_twice_restores_original_order() {
    let world = World::with_deployments(&["aaa", "bbb"]);
    world.add_commit("aaa", r#"{"version":"1.0"}"#);
    world.add_commit("bbb", r#"{"version":"1.1"}"#);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let first = orchestrator.rollback(&sink).unwrap();
    assert_eq!(first.as_str(), "bbb");
    assert_eq!(world.disk_revisions(), ["bbb", "aaa"]);

    let second = orchestrator.rollback(&sink).unwrap();
    assert_eq!(second.as_str(), "aaa");
    assert_eq!(world.disk_revisions(), ["aaa", "bbb"]);

    let changes = sink.rollback_changes();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].revision.as_str(), "aaa");
    assert_eq!(changes[0].info, Some(serde_json::json!({"version": "1.0"})));
    assert_eq!(changes[1].revision.as_str(), "bbb");
    assert_eq!(changes[1].deployment_count, 2);

    assert!(!world.is_locked());
    assert_eq!(world.state().writes, 2);
}

#[test]
fn scenario_rollback_with_single_deployment_leaves_list_unchanged() {
    let world = World::with_deployments(&["aaa"]);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let done = orchestrator.handle(Request::Rollback, &sink);

    assert!(matches!(
        done,
        Completion::RolledBack(Err(OtaError::InsufficientDeployments { count: 1 }))
    ));
    assert!(done.revision().is_none());
    assert_eq!(
        sink.errors(),
        ["At least 2 system versions required for rollback"]
    );
    assert_eq!(world.disk_revisions(), ["aaa"]);
    assert_eq!(world.state().writes, 0);
    assert!(!world.is_locked());
}

#[test]
fn scenario_failed_write_keeps_previous_list() {
    let world = World::with_deployments(&["aaa", "bbb"]);
    world.state().fail_writes = true;
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let done = orchestrator.handle(Request::Rollback, &sink);

    let err = done.error().unwrap();
    assert!(matches!(err, OtaError::BootConfigWrite { .. }));
    assert!(err
        .to_string()
        .starts_with("Failed to update bootloader configuration"));
    assert_eq!(world.disk_revisions(), ["aaa", "bbb"]);
    assert!(sink.rollback_changes().is_empty());
    assert!(!world.is_locked());
}
