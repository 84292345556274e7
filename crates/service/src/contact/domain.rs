use models::{contact, phone_number};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// `phoneNumbers` as clients send it: a JSON array, or a string holding JSON
/// (multipart forms can only carry text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhoneNumbersField {
    List(Vec<String>),
    Encoded(String),
}

/// Decode `phoneNumbers` into a list of trimmed, validated numbers.
///
/// A string is JSON-decoded once: `"[\"1\",\"2\"]"` yields two numbers and
/// `"\"1\""` yields one. A blank string counts as absent. Anything else is a
/// client error.
pub fn parse_phone_numbers(field: Option<PhoneNumbersField>) -> Result<Vec<String>, ServiceError> {
    let raw = match field {
        None => Vec::new(),
        Some(PhoneNumbersField::List(list)) => list,
        Some(PhoneNumbersField::Encoded(text)) => {
            if text.trim().is_empty() {
                Vec::new()
            } else {
                match serde_json::from_str::<PhoneNumbersField>(&text) {
                    Ok(PhoneNumbersField::List(list)) => list,
                    Ok(PhoneNumbersField::Encoded(single)) => vec![single],
                    Err(_) => return Err(ServiceError::Validation("Invalid phoneNumbers format".into())),
                }
            }
        }
    };
    raw.iter()
        .map(|n| phone_number::validate_number(n).map_err(ServiceError::from))
        .collect()
}

/// Uploaded image as received from the client, before resizing.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reject parts whose declared type is not an image. Untyped parts and
    /// `application/octet-stream` are left for the decoder to judge.
    pub fn check_media_type(&self) -> Result<(), ServiceError> {
        match self.content_type.as_deref().map(str::to_ascii_lowercase) {
            None => Ok(()),
            Some(ct) if ct.starts_with("image/") || ct == "application/octet-stream" => Ok(()),
            Some(ct) => Err(ServiceError::Validation(format!(
                "image must be an image file, got {ct} ({})",
                self.file_name.as_deref().unwrap_or("unnamed")
            ))),
        }
    }
}

/// Create/update input; every field is optional at this level and the
/// service decides what is required.
#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: Option<String>,
    pub phone_numbers: Option<PhoneNumbersField>,
    pub image: Option<ImageUpload>,
}

/// JSON body accepted in place of a multipart form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactJsonInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_numbers: Option<PhoneNumbersField>,
}

impl From<ContactJsonInput> for ContactInput {
    fn from(body: ContactJsonInput) -> Self {
        Self { name: body.name, phone_numbers: body.phone_numbers, image: None }
    }
}

/// Resolved update: `None` keeps the stored value, an empty list keeps the
/// stored numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub image: Option<String>,
    pub phone_numbers: Vec<String>,
}

/// Contact with its phone numbers, serialized as
/// `{id, name, image, phoneNumbers: [{id, number, contactId}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactWithPhones {
    #[serde(flatten)]
    pub contact: contact::Model,
    pub phone_numbers: Vec<phone_number::Model>,
}

impl From<(contact::Model, Vec<phone_number::Model>)> for ContactWithPhones {
    fn from((contact, phone_numbers): (contact::Model, Vec<phone_number::Model>)) -> Self {
        Self { contact, phone_numbers }
    }
}

impl ContactWithPhones {
    pub fn id(&self) -> i32 { self.contact.id }

    pub fn numbers(&self) -> impl Iterator<Item = &str> {
        self.phone_numbers.iter().map(|p| p.number.as_str())
    }
}

/// Rendered CSV export.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub rows: usize,
    pub bytes: Vec<u8>,
}
