use crate::model::booking::AdjacentBookingResponse;
use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    comment::Comment,
    id::{CommentId, ItemId, RequestId, UserId},
    item::{
        event::{CreateItem, UpdateItem},
        Item, ItemDetail,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(length(min = 1))]
    pub description: String,
    #[garde(skip)]
    pub available: bool,
    // 依頼に応えて登録する場合のみ指定する
    #[garde(skip)]
    #[serde(default)]
    pub request_id: Option<RequestId>,
}

#[derive(new)]
pub struct CreateItemRequestWithOwner(UserId, CreateItemRequest);
impl From<CreateItemRequestWithOwner> for CreateItem {
    fn from(value: CreateItemRequestWithOwner) -> Self {
        let CreateItemRequestWithOwner(
            owner_id,
            CreateItemRequest {
                name,
                description,
                available,
                request_id,
            },
        ) = value;
        CreateItem::new(owner_id, name, description, available, request_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(length(min = 1))]
    pub description: Option<String>,
    #[garde(skip)]
    pub available: Option<bool>,
}

#[derive(new)]
pub struct UpdateItemRequestWithIds(ItemId, UserId, UpdateItemRequest);
impl From<UpdateItemRequestWithIds> for UpdateItem {
    fn from(value: UpdateItemRequestWithIds) -> Self {
        let UpdateItemRequestWithIds(
            item_id,
            requested_user,
            UpdateItemRequest {
                name,
                description,
                available,
            },
        ) = value;
        UpdateItem::new(item_id, requested_user, name, description, available)
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemSearchQuery {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub request_id: Option<RequestId>,
}

impl From<Item> for ItemResponse {
    fn from(value: Item) -> Self {
        let Item {
            item_id,
            name,
            description,
            available,
            request_id,
            ..
        } = value;
        Self {
            id: item_id,
            name,
            description,
            available,
            request_id,
        }
    }
}

// lastBooking / nextBooking は所有者以外には null になる
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetailResponse {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub last_booking: Option<AdjacentBookingResponse>,
    pub next_booking: Option<AdjacentBookingResponse>,
    pub comments: Vec<CommentResponse>,
}

impl From<ItemDetail> for ItemDetailResponse {
    fn from(value: ItemDetail) -> Self {
        let ItemDetail {
            item,
            last_booking,
            next_booking,
            comments,
        } = value;
        Self {
            id: item.item_id,
            name: item.name,
            description: item.description,
            available: item.available,
            last_booking: last_booking.map(AdjacentBookingResponse::from),
            next_booking: next_booking.map(AdjacentBookingResponse::from),
            comments: comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[garde(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: CommentId,
    pub text: String,
    pub author_name: String,
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(value: Comment) -> Self {
        let Comment {
            comment_id,
            text,
            author_name,
            created_at,
            ..
        } = value;
        Self {
            id: comment_id,
            text,
            author_name,
            created: created_at,
        }
    }
}
