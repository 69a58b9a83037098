use crate::model::user::{
    CreateUserRequest, UpdateUserRequest, UpdateUserRequestWithUserId, UserResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::id::UserId;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn register_user(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    req.validate(&())?;

    let user = registry.user_repository().create(req.into()).await?;
    tracing::info!(user_id = %user.user_id, "user registered");
    Ok(Json(user.into()))
}

pub async fn list_users(State(registry): State<AppRegistry>) -> AppResult<Json<Vec<UserResponse>>> {
    registry
        .user_repository()
        .find_all()
        .await
        .map(|users| users.into_iter().map(UserResponse::from).collect())
        .map(Json)
}

pub async fn show_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<UserResponse>> {
    registry
        .user_repository()
        .find_by_id(user_id)
        .await
        .and_then(|user| match user {
            Some(user) => Ok(Json(user.into())),
            None => Err(AppError::EntityNotFound(format!(
                "User with id {user_id} not found"
            ))),
        })
}

pub async fn update_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    req.validate(&())?;

    let update_user = UpdateUserRequestWithUserId::new(user_id, req);
    registry
        .user_repository()
        .update(update_user.into())
        .await
        .map(UserResponse::from)
        .map(Json)
}

pub async fn delete_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .user_repository()
        .delete(user_id)
        .await
        .map(|_| StatusCode::OK)
}
