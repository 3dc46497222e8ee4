use std::{borrow::Cow, sync::LazyLock};

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{error::AppError, models::ObjectId};

/// Accepted shape for avatar and card links: http(s), optional `www.`, then URL-safe characters.
pub const URL_PATTERN: &str = r"^https?://(www\.)?[a-zA-Z0-9\-._~:/?#\[\]@!$&'()*+,;=]+#?$";

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(URL_PATTERN).expect("valid regex"));

/// Return true if `value` is an acceptable http(s) link.
///
/// ```
/// assert!(mesto_api::validation::is_url("https://example.com/a.png"));
/// assert!(!mesto_api::validation::is_url("not a link"));
/// ```
pub fn is_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

/// `validator` hook for URL-typed fields.
pub fn validate_url(value: &str) -> Result<(), ValidationError> {
    if is_url(value) {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message(Cow::Borrowed("must be a valid http(s) URL")))
    }
}

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// `validator` hook for new passwords: 1 to 72 bytes of UTF-8, counted in bytes.
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if (1..=MAX_PASSWORD_BYTES).contains(&value.len()) {
        Ok(())
    } else {
        Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("must be between 1 and 72 bytes")))
    }
}

/// Checks a path segment such as `:userId` or `:cardId`.
pub fn parse_object_id(raw: &str, field: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse(raw).map_err(|err| AppError::Validation(format!("{field}: {err}")))
}

/// Flattens validator output into one line, fields in alphabetical order.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let reason = err
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("failed {} check", err.code));
                format!("{field}: {reason}")
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// ValidatedJson
///
/// A `Json` extractor that also runs `Validate` on the body. Both malformed JSON and
/// rule violations reject with `AppError::Validation`, so the handler only ever sees
/// well-formed input and every rejection renders through the shared error mapper.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AppError::Validation(describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}
