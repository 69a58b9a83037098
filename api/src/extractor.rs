use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use kernel::model::id::UserId;
use shared::error::AppError;

pub const SHARER_USER_ID_HEADER: &str = "X-Sharer-User-Id";

// リクエストを送ったユーザーを X-Sharer-User-Id ヘッダーから取り出す
// 値の検証は行わず、ユーザーの存在確認はサービス側に任せる
pub struct SharerUser {
    user_id: UserId,
}

impl SharerUser {
    pub fn id(&self) -> UserId {
        self.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SharerUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SHARER_USER_ID_HEADER)
            .ok_or_else(|| {
                AppError::UnauthenticatedError(format!("{SHARER_USER_ID_HEADER} header is missing"))
            })?
            .to_str()
            .map_err(|_| {
                AppError::UnauthenticatedError(format!(
                    "{SHARER_USER_ID_HEADER} header is not valid text"
                ))
            })?;

        let user_id = raw.parse::<UserId>().map_err(|_| {
            AppError::UnauthenticatedError(format!(
                "{SHARER_USER_ID_HEADER} header is not a user id: {raw}"
            ))
        })?;

        Ok(Self { user_id })
    }
}
