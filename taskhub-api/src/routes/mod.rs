/// API route handlers
///
/// - `health`: Liveness probe
/// - `users`: Registration and session lifecycle
/// - `tasks`: Owner-scoped task CRUD

pub mod health;
pub mod tasks;
pub mod users;
