//! Infrastructure implementations.
//!
//! Configuration loading and the transcript port with its file adapter.

pub mod config;
pub mod ports;
pub mod transcript_file;
