/// Authentication and session management
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing
/// - [`jwt`]: Access and refresh token issuing and verification
/// - [`session`]: Refresh session store (digest-keyed)
/// - [`service`]: Register, login, refresh rotation, logout
/// - [`sweeper`]: Background purge of dead sessions
/// - [`middleware`]: Bearer authentication for Axum
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, 64 MiB memory, 3 iterations, 4 lanes
/// - **JWT Tokens**: HS256 signing, HMAC-only verification, typed claims
/// - **Refresh Rotation**: every refresh revokes the presented token
/// - **At-rest Secrecy**: refresh tokens are stored only as SHA-256 digests

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod session;
pub mod sweeper;
