//! PostgreSQL access functions used by `PgStore`.
//!
//! Each function takes any executor so the same statement can run against
//! the pool or inside a transaction.

pub mod comments;
pub mod followers;
pub mod invitations;
pub mod posts;
pub mod roles;
pub mod users;
