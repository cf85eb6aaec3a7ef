//! Bearer token issuance and validation.

pub mod jwt;

pub use jwt::JwtAuthenticator;
