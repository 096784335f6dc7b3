use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::AppConfig;

/// Accepted clock skew between token issuer and verifier.
const TOKEN_LEEWAY_SECONDS: u64 = 60;

/// Syntactically valid Argon2id hash that no password produces. Login
/// verifies unknown emails against this so the failure path costs the same
/// as a real mismatch and cannot be used to enumerate accounts.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$MTIzNDU2Nzg5MDEyMzQ1Ng$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email, lowercase.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub role: String,
}

fn hasher(config: &AppConfig) -> Result<Argon2<'static>, CoreError> {
    let params = Params::new(config.argon2_memory_kib, config.argon2_iterations, 1, None)
        .map_err(|e| CoreError::Internal(format!("invalid argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// One-way hash of a password. Work factor comes from configuration; the
/// resulting PHC string embeds salt and parameters.
pub fn hash_password(config: &AppConfig, password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Constant-time verification against a stored PHC hash. A malformed hash
/// verifies as false rather than erroring, so callers cannot tell stored
/// garbage apart from a wrong password.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Burn the same hashing work as a real verification without a real user.
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

pub fn issue_token(config: &AppConfig, email: &str, role: &str) -> Result<String, CoreError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: email.to_string(),
        iat: now,
        exp: now + config.jwt_expiry_seconds as i64,
        role: role.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| CoreError::Internal(format!("token encoding failed: {e}")))
}

/// Check signature and expiry (with leeway) and return the claims. Any
/// failure collapses into `Unauthenticated`; callers never learn why a
/// token was bad.
pub fn validate_token(config: &AppConfig, token: &str) -> Result<Claims, CoreError> {
    let mut validation = Validation::default();
    validation.leeway = TOKEN_LEEWAY_SECONDS;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| CoreError::Unauthenticated)
}
