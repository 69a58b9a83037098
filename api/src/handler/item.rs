use crate::{
    extractor::SharerUser,
    model::item::{
        CommentResponse, CreateCommentRequest, CreateItemRequest, CreateItemRequestWithOwner,
        ItemDetailResponse, ItemResponse, ItemSearchQuery, UpdateItemRequest,
        UpdateItemRequestWithIds,
    },
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use garde::Validate;
use kernel::model::id::ItemId;
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn register_item(
    user: SharerUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    req.validate(&())?;

    registry
        .item_service()
        .add_item(CreateItemRequestWithOwner::new(user.id(), req).into())
        .await
        .map(ItemResponse::from)
        .map(Json)
}

pub async fn update_item(
    user: SharerUser,
    Path(item_id): Path<ItemId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    req.validate(&())?;

    let update_item = UpdateItemRequestWithIds::new(item_id, user.id(), req);
    registry
        .item_service()
        .update_item(update_item.into())
        .await
        .map(ItemResponse::from)
        .map(Json)
}

pub async fn show_item(
    user: SharerUser,
    Path(item_id): Path<ItemId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ItemDetailResponse>> {
    registry
        .item_service()
        .get_item(user.id(), item_id)
        .await
        .map(ItemDetailResponse::from)
        .map(Json)
}

pub async fn show_owned_items(
    user: SharerUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ItemDetailResponse>>> {
    registry
        .item_service()
        .get_items_by_owner(user.id())
        .await
        .map(|items| items.into_iter().map(ItemDetailResponse::from).collect())
        .map(Json)
}

pub async fn search_items(
    _user: SharerUser,
    Query(query): Query<ItemSearchQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ItemResponse>>> {
    registry
        .item_service()
        .search_items(&query.text)
        .await
        .map(|items| items.into_iter().map(ItemResponse::from).collect())
        .map(Json)
}

pub async fn add_comment(
    user: SharerUser,
    Path(item_id): Path<ItemId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    req.validate(&())?;

    registry
        .item_service()
        .add_comment(user.id(), item_id, req.text)
        .await
        .map(CommentResponse::from)
        .map(Json)
}
