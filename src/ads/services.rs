use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{AdForm, AdView},
    query::{parse_price, AdFilter, PageRequest, PageResult},
    repo_types::{Ad, NewAd},
};
use crate::{
    auth::services::required,
    error::{AppError, AppResult},
    images::services::{discard_images, store_images, MAX_IMAGES_PER_REQUEST},
    state::AppState,
};

/// The only authorization rule: an ad may be changed by the user who created it.
pub fn is_owner(owner_id: Uuid, caller_id: Uuid) -> bool {
    owner_id == caller_id
}

fn ad_not_found() -> AppError {
    AppError::NotFound("Ad not found".into())
}

/// An ad never holds more than `MAX_IMAGES_PER_REQUEST` paths.
fn check_image_count(count: usize) -> AppResult<()> {
    if count > MAX_IMAGES_PER_REQUEST {
        return Err(AppError::validation(format!(
            "At most {MAX_IMAGES_PER_REQUEST} images are allowed"
        )));
    }
    Ok(())
}

/// `None` stays `None`; a supplied value must not be blank.
fn optional(value: Option<String>, field: &str) -> AppResult<Option<String>> {
    value.map(|v| required(Some(v), field)).transpose()
}

pub async fn create_ad(st: &AppState, owner: Uuid, form: AdForm) -> AppResult<Ad> {
    check_image_count(form.images.len())?;
    let title = required(form.title, "title")?;
    let description = required(form.description, "description")?;
    let category = required(form.category, "category")?;
    let city = required(form.city, "city")?;
    let price = parse_price(form.price, "price")?
        .ok_or_else(|| AppError::validation("price is required"))?;

    let images = store_images(st.storage.as_ref(), owner, form.images).await?;

    let new_ad = NewAd {
        user_id: owner,
        title,
        description,
        category,
        price,
        city,
        images,
    };
    let stored = new_ad.images.clone();
    match st.ads.insert(new_ad).await {
        Ok(ad) => {
            info!(ad_id = %ad.id, user_id = %owner, images = ad.images.len(), "ad created");
            Ok(ad)
        }
        Err(e) => {
            discard_images(st.storage.as_ref(), &stored).await;
            Err(e)
        }
    }
}

pub async fn list_ads(
    st: &AppState,
    caller: Option<Uuid>,
    filter: &AdFilter,
    page: PageRequest,
) -> AppResult<PageResult<AdView>> {
    let (ads, total) = st.ads.list(filter, page).await?;
    let views = ads.into_iter().map(|ad| AdView::new(ad, caller)).collect();
    Ok(page.result(views, total))
}

pub async fn get_ad(st: &AppState, id: Uuid) -> AppResult<Ad> {
    st.ads.find_by_id(id).await?.ok_or_else(ad_not_found)
}

async fn owned_ad(st: &AppState, id: Uuid, caller: Uuid) -> AppResult<Ad> {
    let ad = get_ad(st, id).await?;
    if !is_owner(ad.user_id, caller) {
        warn!(ad_id = %id, user_id = %caller, "mutation by non-owner rejected");
        return Err(AppError::Forbidden("Not authorized".into()));
    }
    Ok(ad)
}

/// Keeps the requested paths that already belong to `current`, in request order,
/// without duplicates.
fn retained_images(current: &[String], requested: Vec<String>) -> Vec<String> {
    let mut retained: Vec<String> = Vec::with_capacity(requested.len());
    for path in requested {
        if current.contains(&path) && !retained.contains(&path) {
            retained.push(path);
        }
    }
    retained
}

/// Replaces the supplied fields. The image list becomes the retained entries of
/// `existing_images` (in the order given) followed by the new uploads. An absent
/// `existing_images` retains nothing.
pub async fn update_ad(st: &AppState, id: Uuid, caller: Uuid, form: AdForm) -> AppResult<Ad> {
    check_image_count(form.images.len())?;
    let mut ad = owned_ad(st, id, caller).await?;

    let title = optional(form.title, "title")?;
    let description = optional(form.description, "description")?;
    let city = optional(form.city, "city")?;
    let price = parse_price(form.price, "price")?;

    let retained = retained_images(&ad.images, form.existing_images.unwrap_or_default());
    check_image_count(retained.len() + form.images.len())?;
    let added = store_images(st.storage.as_ref(), caller, form.images).await?;

    let previous = std::mem::take(&mut ad.images);
    ad.images = retained.into_iter().chain(added.iter().cloned()).collect();
    if let Some(v) = title {
        ad.title = v;
    }
    if let Some(v) = description {
        ad.description = v;
    }
    if let Some(v) = city {
        ad.city = v;
    }
    if let Some(v) = price {
        ad.price = v;
    }

    let updated = match st.ads.update(&ad).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            discard_images(st.storage.as_ref(), &added).await;
            return Err(ad_not_found());
        }
        Err(e) => {
            discard_images(st.storage.as_ref(), &added).await;
            return Err(e);
        }
    };

    let dropped: Vec<String> = previous
        .into_iter()
        .filter(|p| !updated.images.contains(p))
        .collect();
    discard_images(st.storage.as_ref(), &dropped).await;

    info!(ad_id = %id, user_id = %caller, "ad updated");
    Ok(updated)
}

pub async fn delete_ad(st: &AppState, id: Uuid, caller: Uuid) -> AppResult<()> {
    let ad = owned_ad(st, id, caller).await?;
    if !st.ads.delete(id).await? {
        return Err(ad_not_found());
    }
    discard_images(st.storage.as_ref(), &ad.images).await;
    info!(ad_id = %id, user_id = %caller, "ad deleted");
    Ok(())
}
