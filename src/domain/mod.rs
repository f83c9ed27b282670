//! Domain Layer
//!
//! The OTA core: revisions, deployment lists, delta superblocks and the
//! ports the update pipelines drive. Nothing here touches the file system
//! or spawns processes.
//!
//! ## Structure
//!
//! - `entities/` - Deployments and commit metadata
//! - `value_objects/` - Revisions, boot parameters, metadata query targets
//! - `services/` - GVariant framing and the static-delta superblock decoder
//! - `ports/` - Interface definitions for infrastructure

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
