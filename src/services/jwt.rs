use crate::error::{Error, Result};
use crate::models::users::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user_id as string
    pub sub: String,
    /// Role at the time the token was issued
    pub role: UserRole,
    /// Expiration time as Unix timestamp
    pub exp: i64,
    /// Issued at time as Unix timestamp
    pub iat: i64,
}

/// Generates a signed JWT for a user
///
/// # Example
/// ```rust,no_run
/// use tutor_attendance::models::users::UserRole;
/// use tutor_attendance::services::jwt::generate_jwt;
/// use uuid::Uuid;
///
/// let token = generate_jwt(Uuid::new_v4(), UserRole::Tutor, "my-secret", 24)?;
/// # Ok::<(), tutor_attendance::error::Error>(())
/// ```
pub fn generate_jwt(user_id: Uuid, role: UserRole, secret: &str, expiration_hours: i64) -> Result<String> {
    let now = Utc::now();
    let expiration = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| Error::Internal(format!("Failed to generate JWT: {}", e)))
}

/// Verifies a JWT token and returns the claims if valid
///
/// # Errors
/// Returns `InvalidToken` if the token is malformed, expired, or has a bad signature
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::InvalidToken("Token has expired".to_string()),
        ErrorKind::InvalidSignature => Error::InvalidToken("Invalid token signature".to_string()),
        _ => Error::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Extracts user_id from a valid JWT token
pub fn get_user_id_from_token(token: &str, secret: &str) -> Result<Uuid> {
    let claims = verify_jwt(token, secret)?;
    Uuid::parse_str(&claims.sub)
        .map_err(|_| Error::InvalidToken("Invalid subject in token".to_string()))
}
