use kernel::model::{
    id::{RequestId, UserId},
    request::ItemRequest,
};
use sqlx::types::chrono::{DateTime, Utc};

#[derive(sqlx::FromRow)]
pub struct ItemRequestRow {
    pub request_id: RequestId,
    pub description: String,
    pub requester_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<ItemRequestRow> for ItemRequest {
    fn from(value: ItemRequestRow) -> Self {
        let ItemRequestRow {
            request_id,
            description,
            requester_id,
            created_at,
        } = value;
        ItemRequest {
            request_id,
            description,
            requester_id,
            created_at,
        }
    }
}
