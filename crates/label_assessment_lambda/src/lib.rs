//! AWS-oriented adapters and handlers for image label assessment.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! Rekognition adapter, and environment configuration). Request/response
//! contract primitives live in `label_assessment_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
