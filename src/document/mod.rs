//! Document Model
//!
//! Records are schemaless JSON objects. This module defines the record type,
//! the strict filter grammar used to select records, and the patch type used
//! by updates.
//!
//! Filters and patches are always parsed from structured data; caller text is
//! never evaluated.

pub mod filter;
pub mod types;

#[cfg(test)]
mod tests;
