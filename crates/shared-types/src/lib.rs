//! # Shared Types Crate
//!
//! Chain entities shared by every crate of the node kernel.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: headers, blocks and transactions are
//!   defined once here.
//! - **Immutable Headers**: a `BlockHeader` can only be obtained from the
//!   validating factory, so every header in the system is well-formed.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
