//! MongoDB persistence.

mod items;
mod models;
mod mongo;
mod storage;
mod users;

pub use mongo::Database;
pub use storage::MongoStorage;
