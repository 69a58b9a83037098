use crate::database::{model::request::ItemRequestRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{RequestId, UserId},
    list::ListOptions,
    request::{event::CreateItemRequest, ItemRequest},
};
use kernel::repository::request::ItemRequestRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct ItemRequestRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ItemRequestRepository for ItemRequestRepositoryImpl {
    async fn create(&self, event: CreateItemRequest) -> AppResult<ItemRequest> {
        let row = sqlx::query_as::<_, ItemRequestRow>(
            r#"
                INSERT INTO requests (description, requester_id, created_at)
                VALUES ($1, $2, $3)
                RETURNING request_id, description, requester_id, created_at
            "#,
        )
        .bind(&event.description)
        .bind(event.requester_id)
        .bind(event.created_at)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(ItemRequest::from(row))
    }

    async fn find_by_id(&self, request_id: RequestId) -> AppResult<Option<ItemRequest>> {
        sqlx::query_as::<_, ItemRequestRow>(
            r#"
                SELECT request_id, description, requester_id, created_at
                FROM requests
                WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(ItemRequest::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_requester(&self, requester_id: UserId) -> AppResult<Vec<ItemRequest>> {
        sqlx::query_as::<_, ItemRequestRow>(
            r#"
                SELECT request_id, description, requester_id, created_at
                FROM requests
                WHERE requester_id = $1
                ORDER BY created_at DESC, request_id DESC
            "#,
        )
        .bind(requester_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(ItemRequest::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_page_of_others(
        &self,
        requester_id: UserId,
        options: ListOptions,
    ) -> AppResult<Vec<ItemRequest>> {
        sqlx::query_as::<_, ItemRequestRow>(
            r#"
                SELECT request_id, description, requester_id, created_at
                FROM requests
                WHERE requester_id <> $1
                ORDER BY created_at DESC, request_id DESC
                LIMIT $2
                OFFSET $3
            "#,
        )
        .bind(requester_id)
        .bind(options.limit())
        .bind(options.offset())
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(ItemRequest::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}
