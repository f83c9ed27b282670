//! Common test utilities for otactl scenario tests.
//!
//! This module provides:
//! - `World`: one shared in-memory device (deployments, commits, lock)
//! - `FakeStore`, `FakeExecutor`, `FakeMetadata`: port fakes over a `World`
//! - `RecordingSink`: collects notices for assertions
//! - `delta`: static-delta package builders

#![allow(dead_code)]

pub mod delta;
pub mod world;

pub use delta::*;
pub use world::*;
