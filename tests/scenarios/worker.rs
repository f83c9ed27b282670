//! Scenario: Requests From a UI Thread
//!
//! Journey: A front end fires several requests without waiting; they run
//! one after another on the worker thread.
//!
//! Success Criteria:
//! - Completions come back for the operation that was requested
//! - No request ever finds the lock already held
//! - Dropping the client waits for queued work

use std::sync::Arc;

use crate::common::*;
use otactl::{OtaClient, Operation};

#[test]
fn scenario_queued_requests_run_one_at_a_time() {
    let world = World::with_deployments(&["aaa", "bbb"]);
    world.set_head("aaa", 100);
    let sink = Arc::new(RecordingSink::default());
    let client = OtaClient::spawn(orchestrator(&world), sink.clone()).unwrap();

    let pending = vec![
        client.initialize(),
        client.rollback(),
        client.update("ccc"),
        client.rollback(),
        client.fetch_remote_info(),
    ];
    let completions: Vec<_> = pending.into_iter().map(|p| p.wait()).collect();

    let operations: Vec<_> = completions.iter().map(|c| c.operation()).collect();
    assert_eq!(
        operations,
        [
            Operation::Initialize,
            Operation::Rollback,
            Operation::Update,
            Operation::Rollback,
            Operation::FetchRemoteInfo,
        ]
    );
    assert!(completions.iter().all(|c| c.is_ok()));

    // [aaa,bbb] -> [bbb,aaa] -> [ccc,bbb] -> [bbb,ccc]
    assert_eq!(world.disk_revisions(), ["bbb", "ccc"]);
    assert_eq!(client.rollback_descriptor().unwrap().revision.as_str(), "ccc");

    let state = world.state();
    assert_eq!(state.lock_conflicts, 0);
    assert!(!state.locked);
}

#[test]
fn scenario_drop_waits_for_queued_work() {
    let world = World::with_deployments(&["aaa", "bbb"]);
    let client = OtaClient::spawn(orchestrator(&world), Arc::new(RecordingSink::default())).unwrap();

    let first = client.rollback();
    let second = client.rollback();
    drop(client);

    assert!(first.wait().is_ok());
    assert!(second.wait().is_ok());
    assert_eq!(world.disk_revisions(), ["aaa", "bbb"]);
}
