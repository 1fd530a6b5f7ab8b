use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Image received as a `data:<mime>;base64,<payload>` URI.
#[derive(Debug)]
pub struct DecodedImage {
    pub body: Bytes,
    pub content_type: String,
}

pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, AppError> {
    let invalid = |why: &str| AppError::Validation(format!("invalid image: {why}"));

    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| invalid("expected a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing payload"))?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("payload must be base64"))?;
    if ext_from_mime(content_type).is_none() {
        return Err(invalid("unsupported image type"));
    }

    let body = Base64::decode_vec(payload.trim()).map_err(|_| invalid("bad base64"))?;
    if body.is_empty() {
        return Err(invalid("empty payload"));
    }
    Ok(DecodedImage {
        body: Bytes::from(body),
        content_type: content_type.to_string(),
    })
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Uploads a recipe image and returns its object key.
pub async fn store_recipe_image(
    st: &AppState,
    author_id: i64,
    image: DecodedImage,
) -> Result<String, AppError> {
    let ext = ext_from_mime(&image.content_type).unwrap_or("bin");
    let key = format!("recipes/images/{}/{}.{}", author_id, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .with_context(|| format!("upload recipe image {key}"))?;
    Ok(key)
}

/// Removes an image that is no longer referenced. Failures are only logged.
pub async fn discard_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, key, "failed to delete recipe image");
    }
}

pub async fn image_url(st: &AppState, key: &str) -> Result<String, AppError> {
    let url = st
        .storage
        .presign_get(key, st.config.image_url_ttl_secs)
        .await
        .with_context(|| format!("presign url for {key}"))?;
    Ok(url)
}
