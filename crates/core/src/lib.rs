//! Shared vocabulary for the refsearch workspace
//!
//! This crate defines the types the index engine and its callers exchange:
//! - `Reference`: the bibliographic record the system-of-record feeds the index
//! - `ReferenceSource`: read access to the system-of-record, consumed by the
//!   consistency coordinator
//! - `Error` / `Result`: the workspace-wide error type
//!
//! No index internals live here; upper layers depend on this crate, never
//! the other way around.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod reference;
pub mod traits;

pub use error::{Error, Result};
pub use reference::Reference;
pub use traits::ReferenceSource;
