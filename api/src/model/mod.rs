pub mod booking;
pub mod item;
pub mod request;
pub mod user;
