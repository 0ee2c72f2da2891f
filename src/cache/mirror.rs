//! Durable local mirror of comment lists.

use tracing::{debug, warn};

use super::storage::SharedStore;
use crate::api::types::Comment;

/// Storage key for the comment list of a news item
pub fn storage_key(news_key: &str) -> String {
  format!("comments_{}", news_key)
}

/// Last known comment list per news item, stored as a JSON array.
///
/// Writes replace the whole list. Nothing here ever fails: an unreadable
/// record reads as absent and a failed write is only logged, since the
/// mirror is a fallback and never the source of truth.
#[derive(Clone)]
pub struct LocalMirror {
  store: SharedStore,
}

impl LocalMirror {
  pub fn new(store: SharedStore) -> Self {
    Self { store }
  }

  pub fn write(&self, news_key: &str, comments: &[Comment]) {
    let key = storage_key(news_key);
    let raw = match serde_json::to_string(comments) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(%key, "Failed to serialize comments: {}", e);
        return;
      }
    };

    match self.store.set(&key, &raw) {
      Ok(()) => debug!(%key, count = comments.len(), "Mirrored comments"),
      Err(e) => warn!(%key, "Failed to mirror comments: {}", e),
    }
  }

  pub fn read(&self, news_key: &str) -> Option<Vec<Comment>> {
    let key = storage_key(news_key);
    let raw = match self.store.get(&key) {
      Ok(raw) => raw?,
      Err(e) => {
        warn!(%key, "Failed to read mirrored comments: {}", e);
        return None;
      }
    };

    match serde_json::from_str(&raw) {
      Ok(comments) => Some(comments),
      Err(e) => {
        warn!(%key, "Discarding corrupt mirrored comments: {}", e);
        None
      }
    }
  }
}
