//! Foundation types for grove.
//!
//! Grove is a content-addressable object graph (commits, tags, trees, blobs)
//! with a negotiation layer that computes the minimal object set one peer
//! must send to bring another up to date. This crate holds the types every
//! other grove crate depends on.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- content-addressed identifier (BLAKE3 hash)
//! - [`TypeError`] -- parse/validation failures for the foundation types

pub mod error;
pub mod object_id;

pub use error::TypeError;
pub use object_id::ObjectId;
