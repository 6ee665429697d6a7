use crate::{
    error::{Error, Result},
    models::users::{NewUser, User, USERS_TABLE},
    store::{self, Query, Store},
};
use uuid::Uuid;

/// Creates a new user row.
///
/// A unique-constraint violation reported by the store surfaces as `Conflict`.
pub async fn create_user(store: &dyn Store, new_user: NewUser) -> Result<User> {
    store::insert_as(store, USERS_TABLE, new_user)
        .await
        .map_err(|e| match e {
            Error::Upstream(msg)
                if msg.contains("duplicate key") || msg.contains("users_email_key") =>
            {
                Error::Conflict("Email already registered".to_string())
            }
            other => other,
        })
}

/// Gets a single user by their ID. The user may not exist.
pub async fn get_user_by_id(store: &dyn Store, id: Uuid) -> Result<Option<User>> {
    store::select_one(store, &Query::table(USERS_TABLE).eq("id", id)).await
}

/// Gets a single user by their email address. The user may not exist.
pub async fn get_user_by_email(store: &dyn Store, email: &str) -> Result<Option<User>> {
    store::select_one(store, &Query::table(USERS_TABLE).eq("email", email)).await
}
