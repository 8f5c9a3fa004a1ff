//! Body and query extractors that reject with the JSON error envelope.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body whose rejections surface as `400 {success: false, message}`.
#[derive(Debug, Clone)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        Ok(AppJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::BadRequest(e.body_text()),
        JsonRejection::JsonSyntaxError(e) => AppError::BadRequest(e.body_text()),
        JsonRejection::MissingJsonContentType(e) => AppError::BadRequest(e.body_text()),
        JsonRejection::BytesRejection(e) => AppError::BadRequest(e.body_text()),
        _ => AppError::BadRequest("Invalid JSON body".to_string()),
    }
}

/// Like [`AppJson`], but a request without a content type yields `None`.
#[derive(Debug, Clone)]
pub struct OptionalAppJson<T>(pub Option<T>);

impl<S, T> FromRequest<S> for OptionalAppJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(CONTENT_TYPE) {
            return Ok(OptionalAppJson(None));
        }

        let AppJson(value) = AppJson::from_request(req, state).await?;
        Ok(OptionalAppJson(Some(value)))
    }
}

/// Query string with the same rejection shape as [`AppJson`].
#[derive(Debug, Clone)]
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::BadRequest(e.body_text()))?;

        Ok(AppQuery(value))
    }
}
