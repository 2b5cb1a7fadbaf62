//! Public album data model.
//!
//! # Responsibility
//! - Define the record shape callers send and receive.
//! - Keep the model independent from the table's native attribute encoding.
//!
//! # Invariants
//! - Every record is identified by its `(artist, album)` pair.

pub mod album;
