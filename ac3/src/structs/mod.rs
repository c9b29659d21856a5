//! Data structures representing format components.

pub mod channel;
pub mod header;
