//! Authentication
//!
//! - `credentials`: user registration and password checks (argon2id)
//! - `session`: login and stateless bearer-token verification
//!
//! Token format: `st-` prefix, base64url JSON claims `{uid, iat, exp}`, then a
//! base64url HMAC-SHA256 signature over the encoded claims.

mod credentials;
mod password;
mod session;
mod tokens;

pub use credentials::CredentialStore;
pub use password::CredentialHasher;
pub use session::{token_ttl_from_secs, SessionIssuer, DEFAULT_TOKEN_TTL};
pub use tokens::{SessionToken, TokenClaims, TokenError, SESSION_TOKEN_PREFIX};
