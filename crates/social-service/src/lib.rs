//! Social API library.
//!
//! Library crate behind the `social-api` binary. Exposes the router, the
//! service layer and the persistence seams so that integration tests and the
//! test harness can assemble the service against in-memory collaborators.

pub mod auth;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod store;
