use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

/// Prefix of every stored path; also the static route images are served under.
pub const UPLOADS_PREFIX: &str = "uploads/";
pub const MAX_IMAGES_PER_REQUEST: usize = 5;

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Writes every image and returns their stored paths, in input order.
/// When one write fails the images already written by this call are removed.
pub async fn store_images(
    storage: &dyn StorageClient,
    owner: Uuid,
    images: Vec<UploadItem>,
) -> anyhow::Result<Vec<String>> {
    let mut paths = Vec::with_capacity(images.len());
    for img in images {
        let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
        let key = format!("ads/{}/{}.{}", owner, Uuid::new_v4(), ext);
        let put = storage
            .put_object(&key, img.body, &img.content_type)
            .await
            .with_context(|| format!("put_object {key}"));
        if let Err(e) = put {
            discard_images(storage, &paths).await;
            return Err(e);
        }
        debug!(key = %key, "image stored");
        paths.push(format!("{UPLOADS_PREFIX}{key}"));
    }
    Ok(paths)
}

/// Best-effort removal of stored images; failures are only logged.
pub async fn discard_images(storage: &dyn StorageClient, paths: &[String]) {
    for path in paths {
        let Some(key) = key_from_path(path) else {
            continue;
        };
        if let Err(e) = storage.delete_object(key).await {
            warn!(error = %e, key = %key, "failed to remove orphaned image");
        }
    }
}

pub fn key_from_path(path: &str) -> Option<&str> {
    path.strip_prefix(UPLOADS_PREFIX)
        .or_else(|| path.strip_prefix('/').and_then(|p| p.strip_prefix(UPLOADS_PREFIX)))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
