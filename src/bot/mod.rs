//! Bot module - Telegram transport around the habit tracker.

pub mod dispatcher;
mod runtime;

pub use dispatcher::build_dispatcher;
pub use runtime::run;
