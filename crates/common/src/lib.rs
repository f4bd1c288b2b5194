//! Shared types, configuration, and connection helpers for Herald.

pub mod config;
pub mod db;
pub mod error;
pub mod redis_pool;
pub mod types;
