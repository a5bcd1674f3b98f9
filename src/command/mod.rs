//! Command Surface
//!
//! A thin text front end over the router, join engine, loader and pipeline.
//! Lines are split into a verb, bare words (collections, keys, paths) and
//! JSON literals; the shell runs the resulting `Command` and renders the
//! per-shard outcome as text.

pub mod parser;
pub mod shell;
pub mod types;
