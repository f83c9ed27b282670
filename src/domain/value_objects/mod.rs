//! Value Objects
//!
//! Immutable values with no identity of their own.

mod boot_params;
mod query_target;
mod revision;

pub use boot_params::BootParams;
pub use query_target::QueryTarget;
pub use revision::Revision;
