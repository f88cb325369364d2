//! Data models and configuration.

pub mod batch;
pub mod config;
pub mod receipt;
