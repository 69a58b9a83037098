//! プロセス内で完結するストア
//!
//! PostgreSQL 実装と同じリポジトリトレイトを実装しており、データベースを用意せずに
//! サービス層や HTTP 層を動かす場合に使う。外部キーの参照先が無い登録は
//! PostgreSQL と同様に失敗させ、ユーザー削除時は関連レコードもまとめて削除する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kernel::model::{
    booking::{
        event::{CreateBooking, UpdateBookingStatus},
        BookedItem, Booking, BookingFilter, BookingStatus,
    },
    comment::{event::CreateComment, Comment},
    id::{BookingId, CommentId, ItemId, RequestId, UserId},
    item::{
        event::{CreateItem, UpdateItem},
        Item,
    },
    list::ListOptions,
    request::{event::CreateItemRequest, ItemRequest},
    user::{
        event::{CreateUser, UpdateUser},
        User,
    },
};
use kernel::repository::{
    booking::BookingRepository, comment::CommentRepository, health::HealthCheckRepository,
    item::ItemRepository, request::ItemRequestRepository, user::UserRepository,
};
use parking_lot::RwLock;
use shared::error::{AppError, AppResult};
use std::{collections::BTreeMap, sync::Arc};

// 予約は ID で参照だけを保持し、アイテムの情報は読み出し時に結合する
#[derive(Debug, Clone)]
struct BookingRecord {
    item_id: ItemId,
    booker_id: UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: BookingStatus,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    item_id: ItemId,
    author_id: UserId,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    sequence: i64,
    users: BTreeMap<UserId, User>,
    items: BTreeMap<ItemId, Item>,
    bookings: BTreeMap<BookingId, BookingRecord>,
    comments: BTreeMap<CommentId, CommentRecord>,
    requests: BTreeMap<RequestId, ItemRequest>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.user_id) != except)
    }

    fn join_booking(&self, booking_id: BookingId, record: &BookingRecord) -> Option<Booking> {
        let item = self.items.get(&record.item_id)?;
        Some(Booking {
            booking_id,
            start: record.start,
            end: record.end,
            status: record.status,
            booker_id: record.booker_id,
            item: BookedItem {
                item_id: item.item_id,
                name: item.name.clone(),
                description: item.description.clone(),
                available: item.available,
                owner_id: item.owner_id,
            },
        })
    }

    fn bookings_where(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter_map(|(id, record)| self.join_booking(*id, record))
            .filter(|b| predicate(b))
            .collect()
    }

    fn join_comment(&self, comment_id: CommentId, record: &CommentRecord) -> Option<Comment> {
        let author = self.users.get(&record.author_id)?;
        Some(Comment {
            comment_id,
            text: record.text.clone(),
            item_id: record.item_id,
            author_id: record.author_id,
            author_name: author.user_name.clone(),
            created_at: record.created_at,
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// start の降順、同時刻は ID の降順で並べてから 1 ページ分を切り出す
fn paginate(mut bookings: Vec<Booking>, options: ListOptions) -> Vec<Booking> {
    bookings.sort_by(|a, b| {
        b.start
            .cmp(&a.start)
            .then_with(|| b.booking_id.cmp(&a.booking_id))
    });
    page(bookings, options)
}

fn page<T>(rows: Vec<T>, options: ListOptions) -> Vec<T> {
    let offset = usize::try_from(options.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(options.limit()).unwrap_or(0);
    rows.into_iter().skip(offset).take(limit).collect()
}

// 作成日時の降順、同時刻は ID の降順
fn newest_first(requests: &mut [ItemRequest]) {
    requests.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.request_id.cmp(&a.request_id))
    });
}

#[async_trait]
impl HealthCheckRepository for InMemoryStore {
    async fn check_db(&self) -> bool {
        true
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, event: CreateUser) -> AppResult<User> {
        let mut tables = self.tables.write();
        if tables.email_taken(&event.email, None) {
            return Err(AppError::DuplicateEmail(format!(
                "User with email {} already exists",
                event.email
            )));
        }
        let user = User {
            user_id: UserId::new(tables.next_id()),
            user_name: event.user_name,
            email: event.email,
        };
        tables.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.tables.read().users.get(&user_id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        Ok(self.tables.read().users.values().cloned().collect())
    }

    async fn update(&self, event: UpdateUser) -> AppResult<User> {
        let mut tables = self.tables.write();
        if let Some(email) = event.email.as_deref() {
            if tables.email_taken(email, Some(event.user_id)) {
                return Err(AppError::DuplicateEmail(format!(
                    "User with email {email} already exists"
                )));
            }
        }
        let user = tables.users.get_mut(&event.user_id).ok_or_else(|| {
            AppError::EntityNotFound(format!("User with id {} not found", event.user_id))
        })?;
        if let Some(user_name) = event.user_name {
            user.user_name = user_name;
        }
        if let Some(email) = event.email {
            user.email = email;
        }
        Ok(user.clone())
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let mut tables = self.tables.write();
        if tables.users.remove(&user_id).is_none() {
            return Err(AppError::EntityNotFound(format!(
                "User with id {user_id} not found"
            )));
        }
        tables.items.retain(|_, item| item.owner_id != user_id);
        tables.requests.retain(|_, r| r.requester_id != user_id);
        let Tables {
            items,
            bookings,
            comments,
            requests,
            ..
        } = &mut *tables;
        bookings.retain(|_, b| b.booker_id != user_id && items.contains_key(&b.item_id));
        comments.retain(|_, c| c.author_id != user_id && items.contains_key(&c.item_id));
        // 依頼が消えたアイテムは依頼との関連だけを外す
        for item in items.values_mut() {
            if item.request_id.is_some_and(|id| !requests.contains_key(&id)) {
                item.request_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn create(&self, event: CreateItem) -> AppResult<Item> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&event.owner_id) {
            return Err(AppError::EntityNotFound(format!(
                "User with id {} not found",
                event.owner_id
            )));
        }
        if let Some(request_id) = event.request_id {
            if !tables.requests.contains_key(&request_id) {
                return Err(AppError::EntityNotFound(format!(
                    "Item request with id {request_id} not found"
                )));
            }
        }
        let item = Item {
            item_id: ItemId::new(tables.next_id()),
            name: event.name,
            description: event.description,
            available: event.available,
            owner_id: event.owner_id,
            request_id: event.request_id,
        };
        tables.items.insert(item.item_id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, item_id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.tables.read().items.get(&item_id).cloned())
    }

    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<Item>> {
        Ok(self
            .tables
            .read()
            .items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn search(&self, keyword: String) -> AppResult<Vec<Item>> {
        let keyword = keyword.to_lowercase();
        Ok(self
            .tables
            .read()
            .items
            .values()
            .filter(|item| {
                item.available
                    && (item.name.to_lowercase().contains(&keyword)
                        || item.description.to_lowercase().contains(&keyword))
            })
            .cloned()
            .collect())
    }

    async fn update(&self, event: UpdateItem) -> AppResult<Item> {
        let mut tables = self.tables.write();
        let item = tables
            .items
            .get_mut(&event.item_id)
            .filter(|item| item.owner_id == event.requested_user)
            .ok_or_else(|| {
                AppError::EntityNotFound(format!(
                    "Item with id {} not found for owner {}",
                    event.item_id, event.requested_user
                ))
            })?;
        if let Some(name) = event.name {
            item.name = name;
        }
        if let Some(description) = event.description {
            item.description = description;
        }
        if let Some(available) = event.available {
            item.available = available;
        }
        Ok(item.clone())
    }

    async fn find_by_request_ids(&self, request_ids: Vec<RequestId>) -> AppResult<Vec<Item>> {
        Ok(self
            .tables
            .read()
            .items
            .values()
            .filter(|item| item.request_id.is_some_and(|id| request_ids.contains(&id)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ItemRequestRepository for InMemoryStore {
    async fn create(&self, event: CreateItemRequest) -> AppResult<ItemRequest> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&event.requester_id) {
            return Err(AppError::EntityNotFound(format!(
                "User with id {} not found",
                event.requester_id
            )));
        }
        let request = ItemRequest {
            request_id: RequestId::new(tables.next_id()),
            description: event.description,
            requester_id: event.requester_id,
            created_at: event.created_at,
        };
        tables.requests.insert(request.request_id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, request_id: RequestId) -> AppResult<Option<ItemRequest>> {
        Ok(self.tables.read().requests.get(&request_id).cloned())
    }

    async fn find_by_requester(&self, requester_id: UserId) -> AppResult<Vec<ItemRequest>> {
        let mut requests: Vec<ItemRequest> = self
            .tables
            .read()
            .requests
            .values()
            .filter(|r| r.requester_id == requester_id)
            .cloned()
            .collect();
        newest_first(&mut requests);
        Ok(requests)
    }

    async fn find_page_of_others(
        &self,
        requester_id: UserId,
        options: ListOptions,
    ) -> AppResult<Vec<ItemRequest>> {
        let mut requests: Vec<ItemRequest> = self
            .tables
            .read()
            .requests
            .values()
            .filter(|r| r.requester_id != requester_id)
            .cloned()
            .collect();
        newest_first(&mut requests);
        Ok(page(requests, options))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, event: CreateComment) -> AppResult<Comment> {
        let mut tables = self.tables.write();
        if !tables.items.contains_key(&event.item_id) || !tables.users.contains_key(&event.author_id)
        {
            return Err(AppError::NoRowsAffectedError(
                "No comment record has been created".into(),
            ));
        }
        let comment_id = CommentId::new(tables.next_id());
        let record = CommentRecord {
            item_id: event.item_id,
            author_id: event.author_id,
            text: event.text,
            created_at: event.created_at,
        };
        let comment = tables.join_comment(comment_id, &record).ok_or_else(|| {
            AppError::NoRowsAffectedError("No comment record has been created".into())
        })?;
        tables.comments.insert(comment_id, record);
        Ok(comment)
    }

    async fn find_by_item_id(&self, item_id: ItemId) -> AppResult<Vec<Comment>> {
        let tables = self.tables.read();
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|(_, c)| c.item_id == item_id)
            .filter_map(|(id, c)| tables.join_comment(*id, c))
            .collect();
        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.comment_id.cmp(&b.comment_id))
        });
        Ok(comments)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn create(&self, event: CreateBooking) -> AppResult<Booking> {
        let mut tables = self.tables.write();
        if !tables.items.contains_key(&event.item_id) || !tables.users.contains_key(&event.booker_id)
        {
            return Err(AppError::NoRowsAffectedError(
                "No booking record has been created".into(),
            ));
        }
        let booking_id = BookingId::new(tables.next_id());
        let record = BookingRecord {
            item_id: event.item_id,
            booker_id: event.booker_id,
            start: event.start,
            end: event.end,
            status: event.status,
        };
        let booking = tables.join_booking(booking_id, &record).ok_or_else(|| {
            AppError::NoRowsAffectedError("No booking record has been created".into())
        })?;
        tables.bookings.insert(booking_id, record);
        Ok(booking)
    }

    async fn update_status(&self, event: UpdateBookingStatus) -> AppResult<Booking> {
        let mut tables = self.tables.write();
        let record = tables.bookings.get_mut(&event.booking_id).ok_or_else(|| {
            AppError::EntityNotFound(format!("Booking with id {} not found", event.booking_id))
        })?;
        if record.status != event.expected {
            tracing::debug!(
                booking_id = %event.booking_id,
                current = %record.status,
                expected = %event.expected,
                "booking status changed concurrently"
            );
            return Err(AppError::InvalidBookingState(format!(
                "Booking (id = {}) is no longer {}",
                event.booking_id, event.expected
            )));
        }
        record.status = event.status;
        let record = record.clone();
        tables
            .join_booking(event.booking_id, &record)
            .ok_or_else(|| AppError::NoRowsAffectedError("booked item is missing".into()))
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        let tables = self.tables.read();
        Ok(tables
            .bookings
            .get(&booking_id)
            .and_then(|record| tables.join_booking(booking_id, record)))
    }

    async fn find_page_by_booker(
        &self,
        booker_id: UserId,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>> {
        let bookings = self
            .tables
            .read()
            .bookings_where(|b| b.booker_id == booker_id && filter.matches(b));
        Ok(paginate(bookings, options))
    }

    async fn find_page_by_owner(
        &self,
        owner_id: UserId,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>> {
        let bookings = self
            .tables
            .read()
            .bookings_where(|b| b.item.owner_id == owner_id && filter.matches(b));
        Ok(paginate(bookings, options))
    }

    async fn find_latest_finished(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        status: BookingStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        Ok(self
            .tables
            .read()
            .bookings_where(|b| {
                b.booker_id == booker_id
                    && b.item.item_id == item_id
                    && b.status == status
                    && b.end < before
            })
            .into_iter()
            .max_by(|a, b| a.end.cmp(&b.end).then_with(|| a.booking_id.cmp(&b.booking_id))))
    }

    async fn find_last_started(
        &self,
        item_id: ItemId,
        status: BookingStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        Ok(self
            .tables
            .read()
            .bookings_where(|b| b.item.item_id == item_id && b.status == status && b.start < before)
            .into_iter()
            .max_by(|a, b| {
                a.start
                    .cmp(&b.start)
                    .then_with(|| a.booking_id.cmp(&b.booking_id))
            }))
    }

    async fn find_next_starting(
        &self,
        item_id: ItemId,
        status: BookingStatus,
        after: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        Ok(self
            .tables
            .read()
            .bookings_where(|b| b.item.item_id == item_id && b.status == status && b.start > after)
            .into_iter()
            .min_by(|a, b| {
                a.start
                    .cmp(&b.start)
                    .then_with(|| a.booking_id.cmp(&b.booking_id))
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seed(store: &InMemoryStore) -> (User, User, Item) {
        let owner = UserRepository::create(store, CreateUser::new("owner".into(), "o@example.com".into()))
            .await
            .unwrap();
        let booker = UserRepository::create(store, CreateUser::new("booker".into(), "b@example.com".into()))
            .await
            .unwrap();
        let item = ItemRepository::create(
            store,
            CreateItem::new(owner.user_id, "Saw".into(), "Hand saw".into(), true, None),
        )
        .await
        .unwrap();
        (owner, booker, item)
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        seed(&store).await;
        let res =
            UserRepository::create(&store, CreateUser::new("x".into(), "o@example.com".into())).await;
        assert!(matches!(res, Err(AppError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn status_update_is_compare_and_swap() {
        let store = InMemoryStore::new();
        let (_, booker, item) = seed(&store).await;
        let now = Utc::now();
        let booking = BookingRepository::create(
            &store,
            CreateBooking::new(
                item.item_id,
                booker.user_id,
                now + Duration::days(1),
                now + Duration::days(2),
                BookingStatus::Waiting,
            ),
        )
        .await
        .unwrap();

        let approved = store
            .update_status(UpdateBookingStatus::new(
                booking.booking_id,
                BookingStatus::Waiting,
                BookingStatus::Approved,
            ))
            .await
            .unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);

        let res = store
            .update_status(UpdateBookingStatus::new(
                booking.booking_id,
                BookingStatus::Waiting,
                BookingStatus::Rejected,
            ))
            .await;
        assert!(matches!(res, Err(AppError::InvalidBookingState(_))));

        let stored = BookingRepository::find_by_id(&store, booking.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Approved);
    }

    #[tokio::test]
    async fn booking_reflects_current_item_state() {
        let store = InMemoryStore::new();
        let (owner, booker, item) = seed(&store).await;
        let now = Utc::now();
        let booking = BookingRepository::create(
            &store,
            CreateBooking::new(
                item.item_id,
                booker.user_id,
                now + Duration::days(1),
                now + Duration::days(2),
                BookingStatus::Waiting,
            ),
        )
        .await
        .unwrap();
        ItemRepository::update(
            &store,
            UpdateItem::new(item.item_id, owner.user_id, Some("Big saw".into()), None, None),
        )
        .await
        .unwrap();

        let stored = BookingRepository::find_by_id(&store, booking.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.item.name, "Big saw");
    }

    #[tokio::test]
    async fn deleting_user_removes_dependent_records() {
        let store = InMemoryStore::new();
        let (owner, booker, item) = seed(&store).await;
        let now = Utc::now();
        let booking = BookingRepository::create(
            &store,
            CreateBooking::new(
                item.item_id,
                booker.user_id,
                now - Duration::days(2),
                now - Duration::days(1),
                BookingStatus::Approved,
            ),
        )
        .await
        .unwrap();

        UserRepository::delete(&store, owner.user_id).await.unwrap();
        assert!(ItemRepository::find_by_id(&store, item.item_id)
            .await
            .unwrap()
            .is_none());
        assert!(BookingRepository::find_by_id(&store, booking.booking_id)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            UserRepository::delete(&store, owner.user_id).await,
            Err(AppError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_requester_detaches_answers() {
        let store = InMemoryStore::new();
        let (owner, booker, _) = seed(&store).await;
        let request = ItemRequestRepository::create(
            &store,
            CreateItemRequest::new(booker.user_id, "need a ladder".into(), Utc::now()),
        )
        .await
        .unwrap();
        let answer = ItemRepository::create(
            &store,
            CreateItem::new(
                owner.user_id,
                "Ladder".into(),
                "Step ladder".into(),
                true,
                Some(request.request_id),
            ),
        )
        .await
        .unwrap();

        let res = ItemRepository::create(
            &store,
            CreateItem::new(
                owner.user_id,
                "Ghost".into(),
                "no such request".into(),
                true,
                Some(RequestId::new(999)),
            ),
        )
        .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        UserRepository::delete(&store, booker.user_id).await.unwrap();
        assert!(ItemRequestRepository::find_by_id(&store, request.request_id)
            .await
            .unwrap()
            .is_none());
        let kept = ItemRepository::find_by_id(&store, answer.item_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.request_id, None);
    }
}
