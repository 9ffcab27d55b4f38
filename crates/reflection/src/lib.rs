//! # elif-reflection: Association Reflection for elif.rs
//!
//! Resolves the metadata of declared relationships between models: the
//! associated model, the primary and foreign keys, the reciprocal
//! relationship and the default column projection. Everything that is not
//! given explicitly at declaration time is inferred from naming conventions
//! the first time it is read, then memoized on the relationship.
//!
//! ```
//! use elif_reflection::{AssociationOptions, Schema};
//!
//! let schema = Schema::new();
//! let artist = schema.define_model("Artist");
//! let album = schema.define_model("Album");
//!
//! schema.many_to_one(&album, "artist", AssociationOptions::new()).unwrap();
//! schema.one_to_many(&artist, "albums", AssociationOptions::new()).unwrap();
//!
//! let albums = schema.lookup(&artist, "albums").unwrap();
//! assert_eq!(albums.reciprocal(&schema).unwrap(), Some("artist"));
//! ```

pub mod column;
pub mod config;
pub mod error;
pub mod inflection;
pub mod model;
pub mod relationships;
pub mod schema;

// Re-export core types
pub use column::*;
pub use config::*;
pub use error::*;
pub use model::*;
pub use relationships::*;
pub use schema::*;
