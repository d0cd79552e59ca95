//! Documents stored in MongoDB.

pub mod item;
pub mod user;

pub use item::DbItem;
pub use user::DbUser;
