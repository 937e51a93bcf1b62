//! Persistence layer for the Certamen backend.
//!
//! This crate contains:
//! - Database connection management
//! - SQL migrations (`src/migrations`)
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
