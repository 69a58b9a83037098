use crate::model::id::{ItemId, RequestId, UserId};
use derive_new::new;

#[derive(new)]
pub struct CreateItem {
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub request_id: Option<RequestId>,
}

#[derive(Debug, new)]
pub struct UpdateItem {
    pub item_id: ItemId,
    pub requested_user: UserId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
}
