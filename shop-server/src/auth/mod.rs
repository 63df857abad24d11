//! Authentication and authorization
//!
//! - [`JwtService`]: token issue/validation
//! - [`CurrentUser`]: request extractor
//! - [`require_admin`]: admin-only route layer
//! - [`password`]: argon2 hashing

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, generate_secure_printable_jwt_secret};
pub use middleware::require_admin;
pub use password::{hash_password, verify_password};
