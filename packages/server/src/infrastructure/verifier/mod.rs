//! TokenVerifier implementations.

pub mod jwt;

pub use jwt::{JwtClaims, JwtTokenVerifier};
