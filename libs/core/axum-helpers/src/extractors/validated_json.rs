//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed `Validate::validate`.
///
/// Malformed JSON is rejected with `JSON_EXTRACTION`; a body that parses but
/// fails validation is rejected with `VALIDATION_ERROR` and per-field details.
///
/// ```ignore
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Register {
///     #[validate(length(min = 1, max = 50))]
///     login: String,
///     #[validate(email)]
///     email: String,
/// }
///
/// async fn register(ValidatedJson(payload): ValidatedJson<Register>) -> String {
///     payload.login
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}
