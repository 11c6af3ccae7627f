/// Authentication primitives for TaskHub
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Session token generation and validation
/// - [`cookie`]: Session cookie construction and parsing
/// - [`middleware`]: Request-time session resolution (the auth gate)
///
/// # Security Properties
///
/// - **Password Hashing**: Argon2id with a fresh random salt per hash
/// - **Session Tokens**: HS256-signed JWTs with a one-hour expiry and a
///   per-issuance anti-forgery value
/// - **Constant-time Comparison**: password verification never
///   short-circuits on byte mismatch

pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;
