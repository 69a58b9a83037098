pub mod booking;
pub mod comment;
pub mod id;
pub mod item;
pub mod list;
pub mod request;
pub mod user;
