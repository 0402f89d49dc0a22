//! Common API utilities and shared types
//!
//! - Extractors whose rejections use the JSON error body
//! - Id parsing. Clients send references as numbers or as numeric strings
//!   (form fields always arrive as strings), so both shapes are accepted.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use crate::api::middleware::ApiError;

// ============================================================================
// Extractors
// ============================================================================

/// `Json` whose rejection is an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        Ok(Self(value))
    }
}

/// `Path` whose rejection is an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` whose rejection is an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        Ok(Self(value))
    }
}

// ============================================================================
// Ids
// ============================================================================

/// A reference id as sent by a client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdParam {
    Int(i64),
    Text(String),
}

impl IdParam {
    /// Resolve to an id. An empty string means "no reference".
    pub fn resolve(&self, field: &str) -> Result<Option<i64>, ApiError> {
        match self {
            IdParam::Int(id) => Ok(Some(*id)),
            IdParam::Text(raw) => parse_id(field, Some(raw)),
        }
    }
}

/// Parse an optional textual id
pub fn parse_id(field: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::validation_error(format!("Invalid {}", field))),
    }
}

/// Resolve an optional id param
pub fn resolve_id(field: &str, param: Option<&IdParam>) -> Result<Option<i64>, ApiError> {
    match param {
        Some(p) => p.resolve(field),
        None => Ok(None),
    }
}

/// Resolve a patch field: absent stays None, null or "" becomes Some(None)
pub fn resolve_patch(
    field: &str,
    param: Option<Option<&IdParam>>,
) -> Result<Option<Option<i64>>, ApiError> {
    match param {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(p)) => p.resolve(field).map(Some),
    }
}

/// Marks a field as present even when its value is `null`.
///
/// Use with `#[serde(default, deserialize_with = "present")]` on an
/// `Option<Option<T>>` field.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        department: Option<Option<IdParam>>,
    }

    fn patch(json: &str) -> Option<Option<i64>> {
        let body: Patch = serde_json::from_str(json).unwrap();
        resolve_patch("department", body.department.as_ref().map(Option::as_ref)).unwrap()
    }

    #[test]
    fn test_patch_field_states() {
        assert_eq!(patch("{}"), None);
        assert_eq!(patch(r#"{"department": null}"#), Some(None));
        assert_eq!(patch(r#"{"department": ""}"#), Some(None));
        assert_eq!(patch(r#"{"department": 4}"#), Some(Some(4)));
        assert_eq!(patch(r#"{"department": "4"}"#), Some(Some(4)));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("club", None).unwrap(), None);
        assert_eq!(parse_id("club", Some(" ")).unwrap(), None);
        assert_eq!(parse_id("club", Some("12")).unwrap(), Some(12));

        let err = parse_id("club", Some("abc")).unwrap_err();
        assert_eq!(err.message, "Invalid club");
    }
}
