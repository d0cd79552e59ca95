//! Caching on top of Moka.
//!
//! Repositories own their caches directly; each one is a [`TypedCache`]
//! built from a [`CacheConfig`] preset.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
