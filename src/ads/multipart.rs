use axum::extract::{multipart::MultipartError, Multipart};
use tracing::debug;

use super::dto::AdForm;
use crate::{
    error::{AppError, AppResult},
    images::{services::MAX_IMAGES_PER_REQUEST, UploadItem},
};

fn bad_body(e: MultipartError) -> AppError {
    AppError::validation(format!("Invalid form data: {}", e.body_text()))
}

/// Reads the ad form. File parts go under `images` (or `images[]`);
/// `existingImages` is a JSON array of already stored paths.
pub async fn read_ad_form(mut mp: Multipart) -> AppResult<AdForm> {
    let mut form = AdForm::default();

    while let Some(field) = mp.next_field().await.map_err(bad_body)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "images" | "images[]" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(bad_body)?;
                if body.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    return Err(AppError::validation("Only image files can be uploaded"));
                }
                if form.images.len() == MAX_IMAGES_PER_REQUEST {
                    return Err(AppError::validation(format!(
                        "At most {MAX_IMAGES_PER_REQUEST} images are allowed"
                    )));
                }
                form.images.push(UploadItem { body, content_type });
            }
            "existingImages" => {
                let raw = field.text().await.map_err(bad_body)?;
                let paths = if raw.trim().is_empty() {
                    Vec::new()
                } else {
                    serde_json::from_str::<Vec<String>>(&raw).map_err(|_| {
                        AppError::validation("existingImages must be a JSON array of strings")
                    })?
                };
                form.existing_images = Some(paths);
            }
            "title" | "description" | "category" | "price" | "city" => {
                let value = field.text().await.map_err(bad_body)?;
                let slot = match name.as_str() {
                    "title" => &mut form.title,
                    "description" => &mut form.description,
                    "category" => &mut form.category,
                    "price" => &mut form.price,
                    _ => &mut form.city,
                };
                *slot = Some(value);
            }
            other => debug!(field = %other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}
