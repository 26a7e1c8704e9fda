//! Custom extractors
//!
//! Both extractors reject with the same `{message}` body as resource errors.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use modelres_sdk::{ErrorBody, QueryRequest};

/// Wire-level output format parameter, accepted and ignored
pub const FORMAT: &str = "format";

type Rejection = (StatusCode, Json<ErrorBody>);

fn bad_request(message: String) -> Rejection {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message,
            errors: Default::default(),
        }),
    )
}

/// Custom JSON extractor with better error messages
pub struct JsonExtractor<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid JSON data: {}", err)
                    }
                    JsonRejection::JsonSyntaxError(_) => {
                        "The data sent in the request was malformed".to_string()
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing 'Content-Type: application/json' header".to_string()
                    }
                    _ => format!("Failed to parse JSON: {}", rejection),
                };
                Err(bad_request(message))
            }
        }
    }
}

/// Query string as a [`QueryRequest`]
///
/// Repeated `pk` parameters are all kept and `format` is dropped.
pub struct ResourceQuery(pub QueryRequest);

impl ResourceQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self(QueryRequest::from_pairs(
            pairs.into_iter().filter(|(key, _)| key != FORMAT),
        ))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ResourceQuery
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|err| bad_request(format!("Invalid query parameters: {}", err)))?;

        Ok(Self::from_pairs(pairs))
    }
}
