//! # Social Test Utilities
//!
//! Shared test utilities for the social API.
//!
//! This crate provides:
//! - Fixed test configuration and credentials (`fixtures`)
//! - A JWT claims builder for forged, expired and misaddressed tokens
//!   (`token_builders`)
//! - A server harness running the real router on a random port against
//!   in-memory collaborators (`server_harness`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use social_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestSocialServer::spawn().await?;
//!     let alice = server.create_active_user("alice").await?;
//!
//!     let response = server
//!         .client()
//!         .get(format!("{}/v1/users/feed", server.url()))
//!         .bearer_auth(&alice.token)
//!         .send()
//!         .await?;
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

pub use fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
