//! # Snapshot Formats
//!
//! Binary persistence for finished enrichment runs.
//!
//! The snapshot is a `postcard` stream with an explicit header (magic
//! bytes, version, counts) validated before any payload allocation.
//! Snapshots are deterministic: two runs over identical inputs and
//! configuration serialize to identical bytes.

pub mod persistence;

pub use persistence::{result_from_bytes, result_to_bytes, SnapshotHeader};
