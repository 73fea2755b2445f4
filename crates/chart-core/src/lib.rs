//! Core types and algorithms for the Chart bitemporal observation store.
//!
//! This crate is deliberately free of file-format and CLI dependencies. It
//! owns the append-only fact store, the two resolvers that reconstruct what
//! was known at a given transaction time, and the mutation writer that records
//! logical updates and deletes as new versions.

pub mod dictionary;
pub mod error;
pub mod fact;
pub mod history;
pub mod mutate;
pub mod outcome;
pub mod point;
mod snapshot;
pub mod store;
pub mod time;

pub use error::{MutationError, QueryError, TimeParseError};

#[cfg(test)]
mod tests;
