use crate::database::{model::item::ItemRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{ItemId, RequestId, UserId},
    item::{
        event::{CreateItem, UpdateItem},
        Item,
    },
};
use kernel::repository::item::ItemRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct ItemRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ItemRepository for ItemRepositoryImpl {
    async fn create(&self, event: CreateItem) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
                INSERT INTO items (name, description, available, owner_id, request_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING item_id, name, description, available, owner_id, request_id
            "#,
        )
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.available)
        .bind(event.owner_id)
        .bind(event.request_id)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::EntityNotFound(format!(
                    "Owner {} or item request of the item not found",
                    event.owner_id
                ))
            }
            e => AppError::SpecificOperationError(e),
        })?;

        Ok(Item::from(row))
    }

    async fn find_by_id(&self, item_id: ItemId) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, ItemRow>(
            r#"
                SELECT item_id, name, description, available, owner_id, request_id
                FROM items
                WHERE item_id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(Item::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, ItemRow>(
            r#"
                SELECT item_id, name, description, available, owner_id, request_id
                FROM items
                WHERE owner_id = $1
                ORDER BY item_id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Item::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn search(&self, keyword: String) -> AppResult<Vec<Item>> {
        let pattern = format!("%{}%", escape_like(&keyword));
        sqlx::query_as::<_, ItemRow>(
            r#"
                SELECT item_id, name, description, available, owner_id, request_id
                FROM items
                WHERE available
                  AND (name ILIKE $1 OR description ILIKE $1)
                ORDER BY item_id ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Item::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn update(&self, event: UpdateItem) -> AppResult<Item> {
        // 所有者以外からの更新は対象行なしとして扱う
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
                UPDATE items
                SET
                    name = COALESCE($1, name),
                    description = COALESCE($2, description),
                    available = COALESCE($3, available)
                WHERE item_id = $4 AND owner_id = $5
                RETURNING item_id, name, description, available, owner_id, request_id
            "#,
        )
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.available)
        .bind(event.item_id)
        .bind(event.requested_user)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Item::from).ok_or_else(|| {
            AppError::EntityNotFound(format!(
                "Item with id {} not found for owner {}",
                event.item_id, event.requested_user
            ))
        })
    }

    async fn find_by_request_ids(&self, request_ids: Vec<RequestId>) -> AppResult<Vec<Item>> {
        let ids: Vec<i64> = request_ids.into_iter().map(RequestId::raw).collect();
        sqlx::query_as::<_, ItemRow>(
            r#"
                SELECT item_id, name, description, available, owner_id, request_id
                FROM items
                WHERE request_id = ANY($1)
                ORDER BY item_id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Item::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

// LIKE のワイルドカードとしてではなく文字として扱う
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
