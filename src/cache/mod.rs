//! Comment caching with offline support.
//!
//! - `storage`: the injected key-value store capability
//! - `mirror`: whole-list JSON mirror of each news item's comments
//! - `sync`: the per-news-item cache that merges remote pages, applies
//!   optimistic writes and falls back to the mirror when the remote fails

mod mirror;
mod storage;
mod sync;
mod traits;

pub use mirror::LocalMirror;
pub use storage::{KeyValueStore, MemoryStore, SharedStore, SqliteStore};
pub use sync::{CommentCache, PageInfo, SyncStatus};
pub use traits::CommentSource;
