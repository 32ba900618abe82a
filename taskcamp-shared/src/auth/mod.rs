/// Authentication and authorization utilities
///
/// This module provides the security primitives for TaskCamp:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Signed access/refresh token generation and validation
/// - [`one_time`]: Single-use, expiring tokens for email verification and
///   password reset (hash-stored, plaintext mailed to the user once)
/// - [`middleware`]: Request credential extraction and the authenticated
///   caller context
/// - [`authorization`]: Per-project role resolution and the required-role
///   gate
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing with separate access/refresh lifetimes
/// - **One-Time Tokens**: CSPRNG generation, SHA-256 hashed at rest
/// - **Constant-time Comparison**: Token verification never short-circuits

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod one_time;
pub mod password;
