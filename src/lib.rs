//! MedTrack Library
//!
//! Medication adherence tracking: medications, dose logs, and the stats
//! derived from them.

pub mod build_info;
pub mod config;
pub mod db;
pub mod engine;
pub mod mcp;
pub mod models;
pub mod session;
pub mod tools;
