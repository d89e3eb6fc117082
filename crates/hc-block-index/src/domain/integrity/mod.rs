//! # Integrity Module
//!
//! Verification and in-place recovery of the level index.
//!
//! ## Module Structure
//!
//! - `check` - The genesis-to-head scan over a [`LevelSource`]
//! - `tests` - Unit tests against an in-memory source

mod check;


pub use check::{check_integrity, HeaderLink, IntegrityOutcome, LevelSource};
