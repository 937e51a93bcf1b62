//! Shared utilities and common types for the Certamen backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing helpers for session tokens
//! - JWT issuing and validation
//! - Password hashing with Argon2id
//! - Image upload encoding (base64 data URLs)
//! - Common validation logic

pub mod crypto;
pub mod image;
pub mod jwt;
pub mod password;
pub mod validation;
