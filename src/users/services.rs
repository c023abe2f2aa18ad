use tracing::info;
use uuid::Uuid;

use super::{
    dto::{Profile, UpdateProfileRequest},
    repo_types::UserChanges,
};
use crate::{
    auth::{
        password::hash_password,
        services::{check_password, normalize_email, required},
    },
    error::{AppError, AppResult},
    state::AppState,
};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

pub async fn get_profile(st: &AppState, user_id: Uuid) -> AppResult<Profile> {
    st.users
        .find_by_id(user_id)
        .await?
        .map(Profile::from)
        .ok_or_else(user_not_found)
}

/// Applies only the supplied fields; a new password is re-hashed before storing.
pub async fn update_profile(
    st: &AppState,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> AppResult<Profile> {
    let name = req.name.map(|n| required(Some(n), "name")).transpose()?;
    let email = req
        .email
        .map(|e| normalize_email(&e))
        .transpose()?;
    let password_hash = match req.password {
        Some(p) => {
            check_password(&p)?;
            Some(hash_password(&p)?)
        }
        None => None,
    };

    let changes = UserChanges {
        name,
        email,
        password_hash,
    };
    let fields = [
        changes.name.as_ref().map(|_| "name"),
        changes.email.as_ref().map(|_| "email"),
        changes.password_hash.as_ref().map(|_| "password"),
    ];
    let user = st
        .users
        .update(user_id, changes)
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, fields = ?fields.iter().flatten().collect::<Vec<_>>(), "profile updated");
    Ok(user.into())
}
