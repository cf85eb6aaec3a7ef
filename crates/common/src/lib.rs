//! Common utilities and types shared across the Social workspace crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (claims, size limits, leeway)
pub mod jwt;
