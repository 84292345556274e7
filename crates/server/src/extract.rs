//! Request extraction for the contact routes.
//!
//! Browsers post `multipart/form-data` (`name`, `phoneNumbers`, `image`);
//! API clients may send the same fields as JSON. A request without a body is
//! an empty form.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::{header, request::Parts, StatusCode};
use axum::Json;
use service::contact::domain::{ContactInput, ContactJsonInput, ImageUpload, PhoneNumbersField};

use crate::errors::JsonApiError;

/// `{id}` path segment; a non-integer id is a JSON 400 instead of axum's plain text.
pub struct ContactId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for ContactId
where
    S: Send + Sync,
{
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|e| JsonApiError::bad_request(e.body_text()))?;
        Ok(ContactId(id))
    }
}

pub struct ContactForm(pub ContactInput);

impl ContactForm {
    pub fn has_image(&self) -> bool { self.0.image.is_some() }
}

#[async_trait]
impl<S> FromRequest<S> for ContactForm
where
    S: Send + Sync,
{
    type Rejection = JsonApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mp = Multipart::from_request(req, state)
                .await
                .map_err(|e| JsonApiError::bad_request(e.body_text()))?;
            return read_multipart(mp).await.map(ContactForm);
        }
        if content_type.starts_with("application/json") {
            let Json(body) = Json::<ContactJsonInput>::from_request(req, state)
                .await
                .map_err(|e| JsonApiError::bad_request(e.body_text()))?;
            return Ok(ContactForm(body.into()));
        }
        if content_type.is_empty() {
            return Ok(ContactForm(ContactInput::default()));
        }
        Err(JsonApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type",
            Some(format!("expected multipart/form-data or application/json, got {content_type}")),
        ))
    }
}

/// Collect the known fields; unknown ones are skipped. One `phoneNumbers`
/// field is JSON text, repeated fields are taken as one number each.
async fn read_multipart(mut mp: Multipart) -> Result<ContactInput, JsonApiError> {
    let mut input = ContactInput::default();
    let mut numbers: Vec<String> = Vec::new();

    while let Some(field) = mp.next_field().await.map_err(|e| JsonApiError::bad_request(e.body_text()))? {
        match field.name() {
            Some("name") => {
                input.name = Some(field.text().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?);
            }
            Some("phoneNumbers") => {
                numbers.push(field.text().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?);
            }
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
                // browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    input.image = Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
                }
            }
            _ => {}
        }
    }

    input.phone_numbers = match numbers.len() {
        0 => None,
        1 => numbers.pop().map(PhoneNumbersField::Encoded),
        _ => Some(PhoneNumbersField::List(numbers)),
    };
    Ok(input)
}
