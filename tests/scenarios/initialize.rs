//! Scenario: Service Start-Up
//!
//! Journey: The update service starts on a device that has never fetched
//! anything from the remote.
//!
//! Success Criteria:
//! - One completion with the booted and default revisions
//! - Empty remote fields, no error
//! - The lock is free afterwards

use crate::common::*;
use otactl::{Completion, Request};
use serde_json::json;

#[test]
fn scenario_first_start_without_remote_head() {
    let world = World::with_deployments(&["aaa"]);
    world.add_commit("aaa", r#"{"version":"1.0"}"#);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let done = orchestrator.handle(Request::Initialize, &sink);

    let report = match done {
        Completion::Initialized(Ok(report)) => report,
        other => panic!("initialize failed: {:?}", other),
    };
    assert_eq!(report.default_revision.unwrap().as_str(), "aaa");
    assert_eq!(report.booted_info, Some(json!({"version": "1.0"})));
    assert_eq!(report.remote_revision, None);
    assert_eq!(report.remote_info, None);
    assert!(sink.errors().is_empty());
    assert!(sink.rollback_changes().is_empty());
    assert_eq!(world.state().lock_count, 1);
    assert!(!world.is_locked());
}

#[test]
fn scenario_start_up_reports_remote_and_rollback() {
    let world = World::with_deployments(&["aaa", "bbb"]);
    world.set_head("ccc", 200);
    world.add_commit("ccc", r#"{"version":"2.0"}"#);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let report = orchestrator.initialize(&sink).unwrap();

    assert_eq!(report.remote_revision.unwrap().as_str(), "ccc");
    assert_eq!(report.remote_info, Some(json!({"version": "2.0"})));
    assert_eq!(
        orchestrator.rollback_descriptor().unwrap().revision.as_str(),
        "bbb"
    );
    assert_eq!(sink.rollback_changes().len(), 1);
}

#[test]
fn scenario_fetch_remote_info_reads_pulled_metadata() {
    let world = World::with_deployments(&["aaa"]);
    world.set_head("ccc", 200);
    world.add_commit("ccc", "{\n  \"version\": \"2.0\"\n}");
    let orchestrator = orchestrator(&world);

    let remote = orchestrator
        .fetch_remote_info(&RecordingSink::default())
        .unwrap();

    assert_eq!(remote.revision.as_str(), "ccc");
    assert_eq!(remote.info, Some(json!({"version": "2.0"})));
    let commands = world.commands();
    assert_eq!(
        commands[..3],
        [
            "ostree pull --commit-metadata-only --disable-static-deltas qt-os linux/qt",
            "ostree pull --subpath=/usr/etc/qt-ota.json qt-os linux/qt",
            "ostree rev-parse linux/qt",
        ]
    );
}
