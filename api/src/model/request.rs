use crate::model::item::ItemResponse;
use chrono::{DateTime, Utc};
use garde::Validate;
use kernel::model::{
    id::{RequestId, UserId},
    list::DEFAULT_PAGE_SIZE,
    request::ItemRequestDetail,
};
use serde::{Deserialize, Serialize};

// アイテム依頼の登録内容。依頼者はヘッダから決まる
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequestBody {
    #[garde(length(min = 1))]
    pub description: String,
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemRequestListQuery {
    #[garde(range(min = 0))]
    #[serde(default)]
    pub from: i64,
    #[garde(range(min = 1))]
    #[serde(default = "default_size")]
    pub size: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequestResponse {
    pub id: RequestId,
    pub description: String,
    pub requester: UserId,
    pub created: DateTime<Utc>,
    pub items: Vec<ItemResponse>,
}

impl From<ItemRequestDetail> for ItemRequestResponse {
    fn from(value: ItemRequestDetail) -> Self {
        let ItemRequestDetail { request, items } = value;
        Self {
            id: request.request_id,
            description: request.description,
            requester: request.requester_id,
            created: request.created_at,
            items: items.into_iter().map(ItemResponse::from).collect(),
        }
    }
}
