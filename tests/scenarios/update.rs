//! Scenario: Online Update
//!
//! Journey: The device is told to move to a new commit, pulls it, deploys
//! it, and after a reboot reports the new build's metadata.
//!
//! Success Criteria:
//! - Metadata of the deployed commit is what the booted system reports
//! - A failed pull deploys nothing and leaves the lock free

use crate::common::*;
use otactl::{OtaError, Request, Revision};
use serde_json::json;

#[test]
fn scenario_deployed_metadata_is_reported_after_reboot() {
    let world = World::with_deployments(&["aaa"]);
    world.add_commit("c1", r#"{"version":"1.2"}"#);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let default = orchestrator.update(&Revision::new("c1"), &sink).unwrap();
    assert_eq!(default.as_str(), "c1");
    assert_eq!(world.disk_revisions(), ["c1", "aaa"]);

    let report = orchestrator.initialize(&sink).unwrap();
    assert_eq!(report.booted_revision.unwrap().as_str(), "c1");
    assert_eq!(report.booted_info, Some(json!({"version": "1.2"})));
    assert!(!world.is_locked());
}

#[test]
fn scenario_update_streams_progress() {
    let world = World::with_deployments(&["aaa"]);
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    orchestrator.update(&Revision::new("c1"), &sink).unwrap();

    assert_eq!(
        sink.statuses(),
        [
            "Checking for missing objects...",
            "Receiving objects: 100%",
            "Deploying...",
            "Copying /etc changes: 0 modified",
        ]
    );
    assert_eq!(world.commands()[0], "ostree pull qt-os:c1");
}

#[test]
fn scenario_failed_pull_deploys_nothing() {
    let world = World::with_deployments(&["aaa"]);
    world.fail_command("ostree pull", "Remote \"qt-os\" not found");
    let orchestrator = orchestrator(&world);
    let sink = RecordingSink::default();

    let done = orchestrator.handle(Request::Update(Revision::new("c1")), &sink);

    assert!(matches!(done.error(), Some(OtaError::CommandRuntime { .. })));
    assert!(done.revision().is_none());
    assert_eq!(sink.errors()[0], "Repository configuration not found");
    assert!(world.state().deploys.is_empty());
    assert_eq!(world.disk_revisions(), ["aaa"]);
    assert!(!world.is_locked());
}
