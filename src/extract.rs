//! Request body extractors answering with the crate's error envelope.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// JSON body whose rejections map to 400 instead of axum's 415/422.
///
/// A body missing a required field answers `MissingField`; unknown fields,
/// wrong types and malformed JSON answer `InvalidParameter`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> Error {
    let message = rejection.body_text();
    match rejection {
        JsonRejection::JsonDataError(_) if message.contains("missing field") => {
            Error::MissingField(message)
        }
        _ => Error::InvalidParameter(message),
    }
}
