use crate::{
    extractor::SharerUser,
    model::request::{CreateItemRequestBody, ItemRequestListQuery, ItemRequestResponse},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use garde::Validate;
use kernel::model::id::RequestId;
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn register_request(
    user: SharerUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateItemRequestBody>,
) -> AppResult<Json<ItemRequestResponse>> {
    req.validate(&())?;

    registry
        .request_service()
        .add_request(user.id(), req.description)
        .await
        .map(ItemRequestResponse::from)
        .map(Json)
}

pub async fn show_own_requests(
    user: SharerUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ItemRequestResponse>>> {
    registry
        .request_service()
        .get_own_requests(user.id())
        .await
        .map(|requests| requests.into_iter().map(ItemRequestResponse::from).collect())
        .map(Json)
}

pub async fn show_others_requests(
    user: SharerUser,
    Query(query): Query<ItemRequestListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ItemRequestResponse>>> {
    query.validate(&())?;

    registry
        .request_service()
        .get_others_requests(user.id(), query.from, query.size)
        .await
        .map(|requests| requests.into_iter().map(ItemRequestResponse::from).collect())
        .map(Json)
}

pub async fn show_request(
    user: SharerUser,
    Path(request_id): Path<RequestId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ItemRequestResponse>> {
    registry
        .request_service()
        .get_request(user.id(), request_id)
        .await
        .map(ItemRequestResponse::from)
        .map(Json)
}
