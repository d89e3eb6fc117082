//! # Domain Layer
//!
//! Pure logic of the block index.
//!
//! ## Modules
//!
//! - `entities` - `BlockInfo`, integrity outcome and report
//! - `errors` - Domain error types
//! - `codec` - Key layout and RLP level records
//! - `integrity` - Genesis-to-head verification and repair

pub mod codec;
pub mod entities;
pub mod errors;
pub mod integrity;
