use chrono::{DateTime, SubsecRound, Utc};
use garde::Validate;
use kernel::model::{
    booking::{event::NewBooking, BookedItem, Booking, BookingStatus},
    id::{BookingId, ItemId, UserId},
    list::DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};

// 予約の開始は現在時刻以降、終了は未来でなければならない。
// 開始と終了の前後関係はサービス側で InvalidDate として扱う
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[garde(skip)]
    pub item_id: ItemId,
    #[garde(custom(not_in_past))]
    pub start: DateTime<Utc>,
    #[garde(custom(in_future))]
    pub end: DateTime<Utc>,
}

fn not_in_past(value: &DateTime<Utc>, _context: &()) -> garde::Result {
    if *value < Utc::now() {
        return Err(garde::Error::new("must not be in the past"));
    }
    Ok(())
}

fn in_future(value: &DateTime<Utc>, _context: &()) -> garde::Result {
    if *value <= Utc::now() {
        return Err(garde::Error::new("must be in the future"));
    }
    Ok(())
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(value: CreateBookingRequest) -> Self {
        let CreateBookingRequest {
            item_id,
            start,
            end,
        } = value;
        // 保存時の精度 (ミリ秒) に揃えてから前後関係を判定させる
        NewBooking::new(item_id, start.trunc_subsecs(3), end.trunc_subsecs(3))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingQuery {
    pub approved: bool,
}

fn default_state() -> String {
    "ALL".into()
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

// state はハンドラで BookingStateFilter に変換する
#[derive(Debug, Deserialize, Validate)]
pub struct BookingListQuery {
    #[garde(skip)]
    #[serde(default = "default_state")]
    pub state: String,
    #[garde(range(min = 0))]
    #[serde(default)]
    pub from: i64,
    #[garde(range(min = 1))]
    #[serde(default = "default_size")]
    pub size: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatusName {
    Waiting,
    Approved,
    Rejected,
    Canceled,
}

impl From<BookingStatus> for BookingStatusName {
    fn from(value: BookingStatus) -> Self {
        match value {
            BookingStatus::Waiting => Self::Waiting,
            BookingStatus::Approved => Self::Approved,
            BookingStatus::Rejected => Self::Rejected,
            BookingStatus::Canceled => Self::Canceled,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: BookingId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatusName,
    pub item: BookedItemResponse,
    pub booker: BookerResponse,
}

impl From<Booking> for BookingResponse {
    fn from(value: Booking) -> Self {
        let Booking {
            booking_id,
            start,
            end,
            status,
            booker_id,
            item,
        } = value;
        Self {
            id: booking_id,
            start,
            end,
            status: status.into(),
            item: item.into(),
            booker: BookerResponse { id: booker_id },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedItemResponse {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub available: bool,
}

impl From<BookedItem> for BookedItemResponse {
    fn from(value: BookedItem) -> Self {
        let BookedItem {
            item_id,
            name,
            description,
            available,
            ..
        } = value;
        Self {
            id: item_id,
            name,
            description,
            available,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookerResponse {
    pub id: UserId,
}

// アイテム表示に添える直前・直後の予約
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacentBookingResponse {
    pub id: BookingId,
    pub booker_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<Booking> for AdjacentBookingResponse {
    fn from(value: Booking) -> Self {
        Self {
            id: value.booking_id,
            booker_id: value.booker_id,
            start: value.start,
            end: value.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(start: DateTime<Utc>, end: DateTime<Utc>) -> CreateBookingRequest {
        CreateBookingRequest {
            item_id: ItemId::new(1),
            start,
            end,
        }
    }

    #[test]
    fn booking_dates_must_lie_ahead() {
        let now = Utc::now();
        assert!(request(now + Duration::days(1), now + Duration::days(2))
            .validate(&())
            .is_ok());
        assert!(request(now - Duration::days(1), now + Duration::days(2))
            .validate(&())
            .is_err());
        assert!(request(now + Duration::days(1), now - Duration::days(2))
            .validate(&())
            .is_err());
        // 前後関係の逆転はここでは弾かない
        assert!(request(now + Duration::days(2), now + Duration::days(1))
            .validate(&())
            .is_ok());
    }

    #[test]
    fn sub_millisecond_dates_are_truncated() {
        let base = (Utc::now() + Duration::days(1)).trunc_subsecs(3);
        let booking: NewBooking = request(
            base + Duration::microseconds(100),
            base + Duration::microseconds(600),
        )
        .into();
        assert_eq!(booking.start, base);
        assert_eq!(booking.end, base);
    }

    #[test]
    fn list_query_bounds() {
        let query = |from, size| BookingListQuery {
            state: default_state(),
            from,
            size,
        };
        assert!(query(0, 10).validate(&()).is_ok());
        assert!(query(-1, 10).validate(&()).is_err());
        assert!(query(0, 0).validate(&()).is_err());
    }

    #[test]
    fn status_is_rendered_in_upper_case() {
        let rendered = serde_json::to_string(&BookingStatusName::from(BookingStatus::Waiting));
        assert_eq!(rendered.ok().as_deref(), Some("\"WAITING\""));
    }
}
