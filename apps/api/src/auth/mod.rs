//! Authentication: Argon2id password hashing, HS256 bearer tokens and the
//! `AuthUser` extractor that guards every protected route.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod tokens;

pub use extractor::AuthUser;
