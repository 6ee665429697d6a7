use crate::{
    error::{Error, Result},
    models::users::{LoginResult, LoginUser, NewUser, PublicUser, RegisterUser, User, UserRole},
    queries::users,
    services::jwt::generate_jwt,
    store::Store,
    validation::{validate_email, validate_name, validate_password},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

/// Registers a new user with validation and password hashing
///
/// Only `tutor` and `user` may be requested; the default is `user`.
pub async fn register_user(store: &dyn Store, register_user: RegisterUser) -> Result<PublicUser> {
    let email = register_user.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_password(&register_user.password)?;
    let name = validate_name(&register_user.name)?;

    let role = match register_user.role.unwrap_or_default() {
        UserRole::Admin => {
            return Err(Error::InvalidParameter(
                "role must be one of: tutor, user".to_string(),
            ));
        }
        role => role,
    };

    if users::get_user_by_email(store, &email).await?.is_some() {
        return Err(Error::Conflict("Email already registered".to_string()));
    }

    let password = hash_password(&register_user.password)?;

    let user = users::create_user(
        store,
        NewUser {
            email,
            password,
            name,
            role,
        },
    )
    .await?;

    tracing::info!(operation = "register", user_id = %user.id, role = %user.role, "User registered");
    Ok(user.into())
}

/// Verifies credentials and issues a bearer token
///
/// Unknown email and wrong password fail identically.
pub async fn login_user(
    store: &dyn Store,
    login_user: LoginUser,
    jwt_secret: &str,
    expiration_hours: i64,
) -> Result<LoginResult> {
    let email = login_user.email.trim().to_lowercase();
    let invalid_credentials = || Error::Authentication("Invalid credentials".to_string());

    let user = users::get_user_by_email(store, &email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&login_user.password, &user.password)? {
        tracing::debug!(operation = "login", user_id = %user.id, "Password mismatch");
        return Err(invalid_credentials());
    }

    let token = generate_jwt(user.id, user.role, jwt_secret, expiration_hours)?;
    tracing::info!(operation = "login", user_id = %user.id, "User logged in");

    Ok(LoginResult {
        user: user.into(),
        token,
    })
}

/// Resolves a token subject to its user row.
pub async fn find_user(store: &dyn Store, user_id: Uuid) -> Result<Option<User>> {
    users::get_user_by_id(store, user_id).await
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against a password hash
///
/// A stored hash that does not parse counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a PHC string");
        return Ok(false);
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Internal(format!("Password verification failed: {}", e))),
    }
}
