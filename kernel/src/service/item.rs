use crate::{
    model::{
        comment::{event::CreateComment, Comment},
        id::{ItemId, RequestId, UserId},
        item::{
            event::{CreateItem, UpdateItem},
            Item, ItemDetail,
        },
        user::User,
    },
    repository::{
        comment::CommentRepository, item::ItemRepository, request::ItemRequestRepository,
        user::UserRepository,
    },
    service::booking::BookingService,
};
use chrono::{DateTime, Utc};
use derive_new::new;
use shared::error::{AppError, AppResult};
use std::sync::Arc;

// アイテムとコメントを扱うサービス
// 予約情報は BookingService が公開する検索を通じてのみ参照する
#[derive(Clone, new)]
pub struct ItemService {
    user_repository: Arc<dyn UserRepository>,
    item_repository: Arc<dyn ItemRepository>,
    comment_repository: Arc<dyn CommentRepository>,
    request_repository: Arc<dyn ItemRequestRepository>,
    booking_service: BookingService,
}

impl ItemService {
    pub async fn add_item(&self, event: CreateItem) -> AppResult<Item> {
        self.require_user(event.owner_id).await?;
        if let Some(request_id) = event.request_id {
            self.require_request(request_id).await?;
        }
        let item = self.item_repository.create(event).await?;
        tracing::info!(item_id = %item.item_id, owner_id = %item.owner_id, "item created");
        Ok(item)
    }

    pub async fn update_item(&self, event: UpdateItem) -> AppResult<Item> {
        // 所有者以外からの更新は存在しないものとして扱う
        match self.item_repository.find_by_id(event.item_id).await? {
            Some(item) if item.owner_id == event.requested_user => {}
            _ => {
                return Err(AppError::EntityNotFound(format!(
                    "Item with id {} owned by user {} not found",
                    event.item_id, event.requested_user
                )))
            }
        }
        self.item_repository.update(event).await
    }

    pub async fn get_item(&self, user_id: UserId, item_id: ItemId) -> AppResult<ItemDetail> {
        self.require_user(user_id).await?;
        let item = self
            .item_repository
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("Item with id {item_id} not found")))?;

        if item.owner_id == user_id {
            self.detail_for_owner(item, Utc::now()).await
        } else {
            let comments = self.comment_repository.find_by_item_id(item.item_id).await?;
            Ok(ItemDetail {
                item,
                last_booking: None,
                next_booking: None,
                comments,
            })
        }
    }

    pub async fn get_items_by_owner(&self, owner_id: UserId) -> AppResult<Vec<ItemDetail>> {
        self.require_user(owner_id).await?;
        let now = Utc::now();
        let items = self.item_repository.find_by_owner(owner_id).await?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            details.push(self.detail_for_owner(item, now).await?);
        }
        Ok(details)
    }

    pub async fn search_items(&self, keyword: &str) -> AppResult<Vec<Item>> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.item_repository.search(keyword.to_string()).await
    }

    // 終了済みの承認済み予約がある場合にのみコメントを投稿できる
    pub async fn add_comment(
        &self,
        user_id: UserId,
        item_id: ItemId,
        text: String,
    ) -> AppResult<Comment> {
        let author = self.require_user(user_id).await?;
        if self.item_repository.find_by_id(item_id).await?.is_none() {
            return Err(AppError::EntityNotFound(format!(
                "Item with id {item_id} not found"
            )));
        }

        let now = Utc::now();
        self.booking_service
            .find_latest_finished_approved_booking(author.user_id, item_id, now)
            .await?
            .ok_or_else(|| {
                AppError::NoFinishedBooking(format!(
                    "User (id = {}) has no finished booking of item (id = {item_id})",
                    author.user_id
                ))
            })?;

        let comment = self
            .comment_repository
            .create(CreateComment::new(item_id, author.user_id, text, now))
            .await?;
        tracing::info!(comment_id = %comment.comment_id, item_id = %item_id, author_id = %author.user_id, "comment added");
        Ok(comment)
    }

    async fn detail_for_owner(&self, item: Item, now: DateTime<Utc>) -> AppResult<ItemDetail> {
        let last_booking = self
            .booking_service
            .find_last_approved_booking(item.item_id, now)
            .await?;
        let next_booking = self
            .booking_service
            .find_next_approved_booking(item.item_id, now)
            .await?;
        let comments = self.comment_repository.find_by_item_id(item.item_id).await?;
        Ok(ItemDetail {
            item,
            last_booking,
            next_booking,
            comments,
        })
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("User with id {user_id} not found")))
    }

    async fn require_request(&self, request_id: RequestId) -> AppResult<()> {
        self.request_repository
            .find_by_id(request_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("Item request with id {request_id} not found"))
            })
    }
}
