/// Wire formats: multipart post forms, location JSON and rendered responses.
use crate::config::MediaConfig;
use crate::error::{AppError, FieldErrors, Result, BLANK, REQUIRED};
use crate::models::{Comment, Image, Location, NewLocation};
use crate::storage::media_url;
use actix_multipart::Multipart;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

pub const INVALID_LOCATION: &str = "Invalid location JSON format";
pub const NOT_A_FILE: &str = "The submitted data was not a file. Check the encoding type on the form.";
pub const NOT_AN_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// One image part of a post form
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fields of a `multipart/form-data` post submission
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: Option<String>,
    pub images: Vec<UploadedImage>,
    pub location: Option<String>,
}

impl PostForm {
    /// Drain a multipart payload within the media upload limits.
    ///
    /// A part over `max_upload_bytes`, more than `max_upload_files` image
    /// parts, or a form over `max_form_bytes` in total is rejected with a
    /// validation error on the offending field as soon as it is seen.
    pub async fn from_multipart(mut payload: Multipart, limits: &MediaConfig) -> Result<Self> {
        let mut form = PostForm::default();
        let mut errors = FieldErrors::new();
        let mut form_bytes = 0usize;
        let mut image_parts = 0usize;

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?;

            let name = field.name().unwrap_or_default().to_string();
            let key = field_key(&name);
            if key == "images" {
                image_parts += 1;
                if image_parts > limits.max_upload_files {
                    return Err(AppError::field(
                        "images",
                        format!("Ensure this field has no more than {} files.", limits.max_upload_files),
                    ));
                }
            }

            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().cloned();

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?;
                if bytes.len() + chunk.len() > limits.max_upload_bytes {
                    return Err(AppError::field(
                        key,
                        format!(
                            "Upload exceeds the maximum size of {} bytes.",
                            limits.max_upload_bytes
                        ),
                    ));
                }
                form_bytes += chunk.len();
                if form_bytes > limits.max_form_bytes {
                    return Err(AppError::field(
                        key,
                        format!(
                            "Submitted data exceeds the maximum size of {} bytes.",
                            limits.max_form_bytes
                        ),
                    ));
                }
                bytes.extend_from_slice(&chunk);
            }

            match key {
                "text" => form.text = Some(utf8_field("text", bytes)?),
                "location" => form.location = Some(utf8_field("location", bytes)?),
                "images" => match (file_name, content_type) {
                    (None, _) => errors.add("images", NOT_A_FILE),
                    (Some(_), Some(ct)) if ct.type_() != mime::IMAGE => {
                        errors.add("images", NOT_AN_IMAGE)
                    }
                    (Some(file_name), content_type) => form.images.push(UploadedImage {
                        file_name,
                        content_type: content_type.map(|ct| ct.essence_str().to_string()),
                        bytes,
                    }),
                },
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        errors.into_result()?;
        Ok(form)
    }
}

fn field_key(name: &str) -> &str {
    match name {
        "images[]" => "images",
        other => other,
    }
}

fn utf8_field(field: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| AppError::field(field, "Invalid UTF-8 data."))
}

/// Post text as sent in update forms
#[derive(Debug, Default, Deserialize)]
pub struct PostTextInput {
    #[serde(default)]
    pub text: Option<String>,
}

/// Comment body; author and post come from the request context
#[derive(Debug, Default, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: Option<String>,
}

/// Trim a text field and enforce presence.
///
/// Returns `Ok(None)` only when the value is absent and `required` is false.
pub fn clean_text(value: Option<&str>, required: bool) -> std::result::Result<Option<String>, &'static str> {
    match value.map(str::trim) {
        None if required => Err(REQUIRED),
        None => Ok(None),
        Some("") => Err(BLANK),
        Some(text) => Ok(Some(text.to_string())),
    }
}

#[derive(Debug, Validate)]
struct LocationInput {
    #[validate(length(
        max = 255,
        message = "Ensure the location name has no more than 255 characters."
    ))]
    name: String,
    latitude: f64,
    longitude: f64,
}

/// Parse the `location` form value.
///
/// Absent or empty input means no location. The value must be a JSON object;
/// `name` defaults to `""` and the coordinates to `0.0`.
pub fn parse_location(raw: Option<&str>) -> std::result::Result<Option<NewLocation>, FieldErrors> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    let malformed = || FieldErrors::single("location", INVALID_LOCATION);

    let value: Value = serde_json::from_str(raw).map_err(|_| malformed())?;
    let object = value.as_object().ok_or_else(malformed)?;

    let name = match object.get("name") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(name)) => name.clone(),
        Some(_) => return Err(malformed()),
    };
    let latitude = coordinate(object, "latitude").ok_or_else(malformed)?;
    let longitude = coordinate(object, "longitude").ok_or_else(malformed)?;

    let input = LocationInput {
        name,
        latitude,
        longitude,
    };
    input
        .validate()
        .map_err(|e| FieldErrors::from(e).nest_under("location"))?;

    Ok(Some(NewLocation {
        name: input.name,
        latitude: input.latitude,
        longitude: input.longitude,
    }))
}

/// `None` means the value is present but not a usable number.
fn coordinate(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match object.get(key) {
        None => Some(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    value.filter(|v| v.is_finite())
}

// =====================================================================
// Responses
// =====================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: Uuid,
    /// Public URL of the stored file
    pub image: String,
}

impl ImageResponse {
    pub fn new(image: &Image, media_prefix: &str) -> Self {
        Self {
            id: image.id,
            image: media_url(media_prefix, &image.image),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author_id,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Geocoded address; null when unknown
    pub reverse_name: Option<String>,
}

impl LocationResponse {
    pub fn new(location: Location, reverse_name: Option<String>) -> Self {
        Self {
            name: location.name,
            latitude: location.latitude,
            longitude: location.longitude,
            reverse_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: Uuid,
    pub image_list: Vec<ImageResponse>,
    pub comments: Vec<CommentResponse>,
    pub likes_count: i64,
    pub location_data: Option<LocationResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  hello "), true), Ok(Some("hello".to_string())));
        assert_eq!(clean_text(None, true), Err(REQUIRED));
        assert_eq!(clean_text(None, false), Ok(None));
        assert_eq!(clean_text(Some("   "), false), Err(BLANK));
    }

    #[test]
    fn test_parse_full_location() {
        let location = parse_location(Some(r#"{"name":"Park","latitude":1.0,"longitude":2.0}"#))
            .unwrap()
            .unwrap();
        assert_eq!(
            location,
            NewLocation {
                name: "Park".to_string(),
                latitude: 1.0,
                longitude: 2.0,
            }
        );
    }

    #[test]
    fn test_location_defaults() {
        let location = parse_location(Some("{}")).unwrap().unwrap();
        assert_eq!(location.name, "");
        assert_eq!(location.latitude, 0.0);
        assert_eq!(location.longitude, 0.0);

        let location = parse_location(Some(r#"{"latitude":"48.85"}"#)).unwrap().unwrap();
        assert_eq!(location.latitude, 48.85);
    }

    #[test]
    fn test_empty_location_is_absent() {
        assert_eq!(parse_location(None).unwrap(), None);
        assert_eq!(parse_location(Some("")).unwrap(), None);
        assert_eq!(parse_location(Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_malformed_location() {
        for raw in [
            "not json",
            "[1, 2]",
            "\"Park\"",
            r#"{"latitude":"north"}"#,
            r#"{"longitude":[1]}"#,
            r#"{"name":5}"#,
        ] {
            let errors = parse_location(Some(raw)).unwrap_err();
            assert_eq!(
                errors.get("location"),
                Some(&[INVALID_LOCATION.to_string()][..]),
                "input: {}",
                raw
            );
        }
    }

    #[test]
    fn test_location_name_too_long() {
        let raw = serde_json::json!({ "name": "x".repeat(256) }).to_string();
        let errors = parse_location(Some(&raw)).unwrap_err();
        assert!(errors.get("location").is_some());
        assert!(errors.get("name").is_none());

        let raw = serde_json::json!({ "name": "x".repeat(255) }).to_string();
        assert!(parse_location(Some(&raw)).unwrap().is_some());
    }

    #[test]
    fn test_comment_input_ignores_client_author() {
        let input: CommentInput = serde_json::from_value(serde_json::json!({
            "text": "nice",
            "author": "someone-else",
            "post": "another-post",
        }))
        .unwrap();
        assert_eq!(input.text.as_deref(), Some("nice"));
    }
}
