use crate::{
    extractor::SharerUser,
    model::booking::{
        BookingListQuery, BookingResponse, CreateBookingRequest, UpdateBookingQuery,
    },
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use garde::Validate;
use kernel::model::{booking::BookingStateFilter, id::BookingId};
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn register_booking(
    user: SharerUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    req.validate(&())?;

    registry
        .booking_service()
        .add_booking(user.id(), req.into())
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn decide_booking(
    user: SharerUser,
    Path(booking_id): Path<BookingId>,
    Query(query): Query<UpdateBookingQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    registry
        .booking_service()
        .update(booking_id, user.id(), query.approved)
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn show_booking(
    user: SharerUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    registry
        .booking_service()
        .get_booking_by_id(booking_id, user.id())
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn show_booker_bookings(
    user: SharerUser,
    Query(query): Query<BookingListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    // 未知の state はページングの検証より先に弾く
    let state = BookingStateFilter::parse(&query.state)?;
    query.validate(&())?;

    registry
        .booking_service()
        .get_all_bookings_by_user(user.id(), state, query.from, query.size)
        .await
        .map(|bookings| bookings.into_iter().map(BookingResponse::from).collect())
        .map(Json)
}

pub async fn show_owner_bookings(
    user: SharerUser,
    Query(query): Query<BookingListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let state = BookingStateFilter::parse(&query.state)?;
    query.validate(&())?;

    registry
        .booking_service()
        .get_all_bookings_all_items_by_owner(user.id(), state, query.from, query.size)
        .await
        .map(|bookings| bookings.into_iter().map(BookingResponse::from).collect())
        .map(Json)
}
