use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// JSON body extractor that runs `validator` checks before the handler.
///
/// Broken JSON is a 400; well-formed JSON with missing or mistyped fields is
/// a 422, as are out-of-range values (listed per field).
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(e) => {
                    AppError::UnprocessableEntity(anyhow::anyhow!(e.body_text()))
                }
                other => AppError::BadRequest(anyhow::anyhow!(other.body_text())),
            })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
