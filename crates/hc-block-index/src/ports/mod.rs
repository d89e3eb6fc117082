//! # Ports Layer
//!
//! Defines the port traits for the block index.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (API used by chain selection)
//! - `outbound.rs` - Driven ports (storage and header codec)

pub mod inbound;
pub mod outbound;
