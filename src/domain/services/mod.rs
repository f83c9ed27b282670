//! Domain Services
//!
//! Pure logic with no I/O dependencies.

pub mod commands;
pub mod gvariant;
pub mod superblock;

pub use commands::OstreeCommands;
pub use gvariant::{GVariantError, Value, Variant, VariantType};
pub use superblock::{DeltaCommit, DeltaSuperblock, SUPERBLOCK_FORMAT};
