//! Shared label assessment primitives.
//!
//! This crate owns the request/response contract between the orchestrating
//! workflow and the label detection service. It intentionally excludes AWS SDK
//! and Lambda runtime concerns.

pub mod contract;
