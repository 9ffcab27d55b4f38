//! Relationships Module - declared relationships and their resolution

pub mod metadata;
pub mod reflection;
pub mod registry;
pub mod resolution;

// Re-export main types
pub use metadata::*;
pub use reflection::*;
pub use registry::*;
