//! Serializer Adapters
//!
//! Implementations of the `HeaderSerializer` trait.

mod bincode;

pub use self::bincode::BincodeHeaderSerializer;
