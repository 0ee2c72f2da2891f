//! Per-news-item comment cache.
//!
//! Every news item key moves through `Idle -> Loading -> Loaded | Degraded`.
//! Remote failures never escape this module: reads fall back to the local
//! mirror, writes fall back to a locally synthesized comment, and the failure
//! message is kept per key for the caller to display.
//!
//! Operations on the same key are not serialized. Two overlapping `load`s for
//! one key both run to completion and whichever finishes last determines the
//! list and page info.

use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::mirror::LocalMirror;
use super::traits::CommentSource;
use crate::api::types::{Comment, CommentId, NewComment, PageRequest};
use crate::session::Session;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination bookkeeping for one news item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
  /// Last page requested
  pub page: u32,
  pub size: u32,
  pub has_more: bool,
  /// Total reported by the server, 0 when unknown
  pub total: u64,
}

impl Default for PageInfo {
  fn default() -> Self {
    Self {
      page: 0,
      size: DEFAULT_PAGE_SIZE,
      has_more: true,
      total: 0,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncStatus {
  /// Nothing requested yet
  #[default]
  Idle,
  Loading,
  /// Last load came from the server
  Loaded,
  /// Last load failed and the list is whatever was available locally
  Degraded,
}

#[derive(Debug, Default)]
struct Entry {
  /// `None` until something has been loaded or added
  comments: Option<Vec<Comment>>,
  loading: bool,
  error: Option<String>,
  page: Option<PageInfo>,
  status: SyncStatus,
}

/// In-memory comment state for all news items, mirrored to local storage.
pub struct CommentCache<R: CommentSource> {
  remote: R,
  mirror: LocalMirror,
  session: Arc<Session>,
  entries: Mutex<HashMap<String, Entry>>,
  last_local_id: AtomicI64,
}

impl<R: CommentSource> CommentCache<R> {
  pub fn new(remote: R, mirror: LocalMirror, session: Arc<Session>) -> Self {
    Self {
      remote,
      mirror,
      session,
      entries: Mutex::new(HashMap::new()),
      last_local_id: AtomicI64::new(0),
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
    // Entries are plain data, so a poisoned lock is still usable
    self.entries.lock().unwrap_or_else(|p| p.into_inner())
  }

  fn with_entry<T>(&self, news_key: &str, f: impl FnOnce(&mut Entry) -> T) -> T {
    let mut entries = self.entries();
    f(entries.entry(news_key.to_string()).or_default())
  }

  /// Load one page of comments.
  ///
  /// Page 0 replaces the list, later pages are appended as-is. Requesting a
  /// page that is already loaded duplicates its comments.
  pub async fn load(&self, news_key: &str, page: u32, size: u32) {
    self.load_page(news_key, PageRequest::new(page, size)).await
  }

  /// Load a page with explicit request options.
  pub async fn load_page(&self, news_key: &str, request: PageRequest) {
    self.with_entry(news_key, |entry| {
      entry.loading = true;
      entry.error = None;
      entry.status = SyncStatus::Loading;
    });

    let result = self.remote.list_comments(news_key, &request).await;

    let mut entries = self.entries();
    let entry = entries.entry(news_key.to_string()).or_default();

    match result {
      Ok(page) => {
        let returned = page.items.len() as u64;
        let list = entry.comments.get_or_insert_with(Vec::new);
        if request.page == 0 {
          *list = page.items;
        } else {
          list.extend(page.items);
        }

        let loaded = list.len() as u64;
        let total = page.total.unwrap_or(0);
        let has_more = if total > 0 {
          loaded < total
        } else {
          returned >= u64::from(request.size)
        };

        entry.page = Some(PageInfo {
          page: request.page,
          size: request.size,
          has_more,
          total,
        });
        entry.status = SyncStatus::Loaded;
        debug!(news_key, page = request.page, returned, loaded, has_more, "Loaded comments");

        self.mirror.write(news_key, list);
      }
      Err(e) => {
        warn!(news_key, page = request.page, "Failed to load comments: {}", e);
        entry.error = Some(e.to_string());

        // A list from an earlier successful load is kept as-is
        let list = entry
          .comments
          .get_or_insert_with(|| self.mirror.read(news_key).unwrap_or_default());

        entry.page = Some(PageInfo {
          page: 0,
          size: request.size,
          has_more: false,
          total: list.len() as u64,
        });
        entry.status = SyncStatus::Degraded;
      }
    }

    entry.loading = false;
  }

  /// Post a comment, falling back to a local-only comment on failure.
  ///
  /// The list grows by exactly one either way; the comment now at its front
  /// is returned. A local comment is not reconciled with the server and is
  /// dropped by the next page-0 load.
  pub async fn add(&self, news_key: &str, comment: NewComment) -> Comment {
    self.with_entry(news_key, |entry| entry.error = None);

    let result = self.remote.create_comment(news_key, &comment).await;

    let mut entries = self.entries();
    let entry = entries.entry(news_key.to_string()).or_default();
    let list = entry.comments.get_or_insert_with(Vec::new);

    let created = match result {
      Ok(created) => {
        if let Some(info) = entry.page.as_mut() {
          info.total += 1;
        }
        created
      }
      Err(e) => {
        warn!(news_key, "Failed to post comment, keeping it locally: {}", e);
        entry.error = Some(e.to_string());
        self.local_comment(news_key, comment)
      }
    };

    list.insert(0, created.clone());
    self.mirror.write(news_key, list);
    created
  }

  /// Delete a comment.
  ///
  /// Local-only comments are dropped without contacting the server. Server
  /// comments are only touched once the server accepted the deletion, and are
  /// then kept soft-deleted. Returns whether the comment is gone.
  pub async fn remove(&self, news_key: &str, comment_id: &CommentId) -> bool {
    if !comment_id.is_local() {
      self.with_entry(news_key, |entry| entry.error = None);

      if let Err(e) = self.remote.delete_comment(news_key, comment_id).await {
        warn!(news_key, %comment_id, "Failed to delete comment: {}", e);
        self.with_entry(news_key, |entry| entry.error = Some(e.to_string()));
        return false;
      }
    }

    let mut entries = self.entries();
    let entry = entries.entry(news_key.to_string()).or_default();
    let list = entry.comments.get_or_insert_with(Vec::new);

    match comment_id {
      CommentId::Local(_) => list.retain(|c| &c.id != comment_id),
      CommentId::Server(_) => {
        let mut changed = false;
        for comment in list.iter_mut().filter(|c| &c.id == comment_id && !c.deleted) {
          comment.deleted = true;
          changed = true;
        }
        if changed {
          if let Some(info) = entry.page.as_mut() {
            info.total = info.total.saturating_sub(1);
          }
        }
      }
    }

    self.mirror.write(news_key, list);
    true
  }

  /// Empty the list and reset pagination, error and status.
  pub fn clear(&self, news_key: &str) {
    self.with_entry(news_key, |entry| {
      entry.comments = Some(Vec::new());
      entry.page = Some(PageInfo::default());
      entry.error = None;
      entry.status = SyncStatus::Idle;
    });
    self.mirror.write(news_key, &[]);
  }

  /// All cached comments for a news item, soft-deleted ones included.
  pub fn comments(&self, news_key: &str) -> Vec<Comment> {
    self
      .entries()
      .get(news_key)
      .and_then(|e| e.comments.clone())
      .unwrap_or_default()
  }

  pub fn visible_comments(&self, news_key: &str) -> Vec<Comment> {
    let mut comments = self.comments(news_key);
    comments.retain(|c| !c.deleted);
    comments
  }

  pub fn find(&self, news_key: &str, comment_id: &CommentId) -> Option<Comment> {
    self
      .entries()
      .get(news_key)?
      .comments
      .as_ref()?
      .iter()
      .find(|c| &c.id == comment_id)
      .cloned()
  }

  #[cfg(test)]
  pub fn is_loading(&self, news_key: &str) -> bool {
    self.entries().get(news_key).is_some_and(|e| e.loading)
  }

  pub fn error(&self, news_key: &str) -> Option<String> {
    self.entries().get(news_key).and_then(|e| e.error.clone())
  }

  pub fn page_info(&self, news_key: &str) -> PageInfo {
    self
      .entries()
      .get(news_key)
      .and_then(|e| e.page)
      .unwrap_or_default()
  }

  pub fn has_more(&self, news_key: &str) -> bool {
    self.page_info(news_key).has_more
  }

  pub fn status(&self, news_key: &str) -> SyncStatus {
    self
      .entries()
      .get(news_key)
      .map(|e| e.status)
      .unwrap_or_default()
  }

  fn local_comment(&self, news_key: &str, comment: NewComment) -> Comment {
    let (author_id, author_name) = self.session.author();
    let news_id = news_key.parse().unwrap_or_else(|_| {
      debug!(news_key, "News key is not numeric, attributing local comment to news 0");
      0
    });

    Comment {
      id: CommentId::Local(format!("local-{}", self.next_local_id())),
      news_id,
      author_id,
      author_name,
      content: comment.content,
      image_url: comment.image_url,
      created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
      deleted: false,
    }
  }

  /// Millisecond timestamp, bumped when needed so ids never repeat in-process.
  fn next_local_id(&self) -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = self
      .last_local_id
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
      })
      .unwrap_or(now);
    now.max(previous + 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Page, Role, User};
  use crate::cache::{MemoryStore, SharedStore};
  use crate::error::{Error, Result};
  use std::collections::VecDeque;
  use std::time::Duration;

  /// Scripted comment source. Unscripted calls fail as if offline.
  #[derive(Default)]
  struct FakeSource {
    lists: Mutex<VecDeque<(Duration, Result<Page<Comment>>)>>,
    creates: Mutex<VecDeque<Result<Comment>>>,
    deletes: Mutex<VecDeque<Result<()>>>,
  }

  impl FakeSource {
    fn list(self, items: Vec<Comment>, total: Option<u64>) -> Self {
      self.list_after(Duration::ZERO, items, total)
    }

    fn list_after(self, delay: Duration, items: Vec<Comment>, total: Option<u64>) -> Self {
      self
        .lists
        .lock()
        .unwrap()
        .push_back((delay, Ok(Page { items, total })));
      self
    }

    fn list_fails(self) -> Self {
      self.lists.lock().unwrap().push_back((
        Duration::ZERO,
        Err(Error::RequestFailed("Failed to get comments".into())),
      ));
      self
    }

    fn create(self, comment: Comment) -> Self {
      self.creates.lock().unwrap().push_back(Ok(comment));
      self
    }

    fn delete(self, result: Result<()>) -> Self {
      self.deletes.lock().unwrap().push_back(result);
      self
    }
  }

  fn offline() -> Error {
    Error::RequestFailed("network unreachable".into())
  }

  impl CommentSource for FakeSource {
    async fn list_comments(&self, _news_key: &str, _request: &PageRequest) -> Result<Page<Comment>> {
      let next = self.lists.lock().unwrap().pop_front();
      match next {
        Some((delay, result)) => {
          if !delay.is_zero() {
            tokio::time::sleep(delay).await;
          }
          result
        }
        None => Err(offline()),
      }
    }

    async fn create_comment(&self, _news_key: &str, _comment: &NewComment) -> Result<Comment> {
      let next = self.creates.lock().unwrap().pop_front();
      next.unwrap_or_else(|| Err(offline()))
    }

    async fn delete_comment(&self, _news_key: &str, _comment_id: &CommentId) -> Result<()> {
      let next = self.deletes.lock().unwrap().pop_front();
      next.unwrap_or_else(|| Err(offline()))
    }
  }

  fn comment(id: i64, news_id: i64) -> Comment {
    Comment {
      id: CommentId::Server(id),
      news_id,
      author_id: 1,
      author_name: "Ada".into(),
      content: format!("comment {}", id),
      image_url: None,
      created_at: "2024-05-01T10:00:00".into(),
      deleted: false,
    }
  }

  fn comments(ids: std::ops::RangeInclusive<i64>, news_id: i64) -> Vec<Comment> {
    ids.map(|id| comment(id, news_id)).collect()
  }

  fn cache_with(source: FakeSource, store: SharedStore) -> CommentCache<FakeSource> {
    let session = Arc::new(Session::restore(store.clone()));
    CommentCache::new(source, LocalMirror::new(store), session)
  }

  fn cache(source: FakeSource) -> CommentCache<FakeSource> {
    cache_with(source, Arc::new(MemoryStore::new()))
  }

  #[test]
  fn test_untouched_key_defaults() {
    let cache = cache(FakeSource::default());
    assert!(cache.comments("1").is_empty());
    assert!(!cache.is_loading("1"));
    assert_eq!(cache.error("1"), None);
    assert_eq!(cache.page_info("1"), PageInfo::default());
    assert_eq!(cache.status("1"), SyncStatus::Idle);
  }

  #[tokio::test]
  async fn test_short_first_page_without_total_has_no_more() {
    let cache = cache(FakeSource::default().list(comments(1..=3, 42), None));

    cache.load("42", 0, 10).await;

    assert_eq!(cache.comments("42").len(), 3);
    assert!(!cache.has_more("42"));
    assert_eq!(cache.status("42"), SyncStatus::Loaded);
    assert_eq!(cache.error("42"), None);
    assert!(!cache.is_loading("42"));
  }

  #[tokio::test]
  async fn test_full_first_page_without_total_has_more() {
    let cache = cache(FakeSource::default().list(comments(1..=10, 42), None));

    cache.load("42", 0, 10).await;

    assert!(cache.has_more("42"));
    assert_eq!(
      cache.page_info("42"),
      PageInfo {
        page: 0,
        size: 10,
        has_more: true,
        total: 0
      }
    );
  }

  #[tokio::test]
  async fn test_total_header_drives_has_more() {
    let source = FakeSource::default()
      .list(comments(1..=2, 5), Some(4))
      .list(comments(3..=4, 5), Some(4));
    let cache = cache(source);

    cache.load("5", 0, 2).await;
    assert!(cache.has_more("5"));
    assert_eq!(cache.page_info("5").total, 4);

    cache.load("5", 1, 2).await;
    assert!(!cache.has_more("5"));
    assert_eq!(cache.page_info("5").page, 1);

    let ids: Vec<_> = cache.comments("5").into_iter().map(|c| c.id).collect();
    assert_eq!(ids, comments(1..=4, 5).into_iter().map(|c| c.id).collect::<Vec<_>>());
  }

  #[tokio::test]
  async fn test_later_pages_append_and_first_page_replaces() {
    let source = FakeSource::default()
      .list(comments(1..=2, 5), None)
      .list(comments(3..=3, 5), None)
      .list(comments(9..=9, 5), None);
    let cache = cache(source);

    cache.load("5", 0, 2).await;
    cache.load("5", 1, 2).await;
    assert_eq!(cache.comments("5").len(), 3);
    assert!(!cache.has_more("5"));

    cache.load("5", 0, 2).await;
    assert_eq!(cache.comments("5"), vec![comment(9, 5)]);
  }

  #[tokio::test]
  async fn test_failed_refresh_keeps_existing_list() {
    let source = FakeSource::default()
      .list(comments(1..=4, 8), Some(20))
      .list_fails();
    let cache = cache(source);

    cache.load("8", 0, 4).await;
    let before = cache.comments("8");

    cache.load("8", 0, 4).await;

    assert_eq!(cache.comments("8"), before);
    assert_eq!(cache.error("8").as_deref(), Some("Failed to get comments"));
    assert_eq!(cache.status("8"), SyncStatus::Degraded);
    assert_eq!(
      cache.page_info("8"),
      PageInfo {
        page: 0,
        size: 4,
        has_more: false,
        total: 4
      }
    );
    assert!(!cache.is_loading("8"));
  }

  #[tokio::test]
  async fn test_failed_later_page_keeps_list_and_resets_paging() {
    let source = FakeSource::default()
      .list(comments(1..=4, 8), Some(12))
      .list_fails();
    let cache = cache(source);

    cache.load("8", 0, 4).await;
    assert!(cache.has_more("8"));

    cache.load("8", 1, 4).await;

    assert_eq!(cache.comments("8"), comments(1..=4, 8));
    assert_eq!(cache.status("8"), SyncStatus::Degraded);
    assert_eq!(
      cache.page_info("8"),
      PageInfo {
        page: 0,
        size: 4,
        has_more: false,
        total: 4
      }
    );
  }

  #[tokio::test]
  async fn test_failed_first_load_without_mirror_is_empty() {
    let cache = cache(FakeSource::default());

    cache.load("3", 0, 10).await;

    assert!(cache.comments("3").is_empty());
    assert!(!cache.has_more("3"));
    assert_eq!(cache.error("3").as_deref(), Some("network unreachable"));
  }

  #[tokio::test]
  async fn test_mirror_survives_restart() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let source = FakeSource::default()
      .list(comments(1..=3, 42), None)
      .create(comment(50, 42));

    let written = {
      let cache = cache_with(source, store.clone());
      cache.load("42", 0, 10).await;
      cache.add("42", NewComment::text("comment 50")).await;
      // Local comment on top of the server one
      cache.add("42", NewComment::text("written offline")).await;
      cache.comments("42")
    };
    assert_eq!(written.len(), 5);

    let restarted = cache_with(FakeSource::default(), store);
    restarted.load("42", 0, 10).await;

    assert_eq!(restarted.comments("42"), written);
    assert_eq!(restarted.status("42"), SyncStatus::Degraded);
    assert_eq!(restarted.page_info("42").total, 5);
  }

  #[tokio::test]
  async fn test_add_success_prepends_and_counts() {
    let source = FakeSource::default()
      .list(comments(1..=2, 42), Some(2))
      .create(comment(3, 42));
    let cache = cache(source);

    cache.load("42", 0, 10).await;
    let created = cache.add("42", NewComment::text("comment 3")).await;

    assert_eq!(created.id, CommentId::Server(3));
    let list = cache.comments("42");
    assert_eq!(list.len(), 3);
    assert_eq!(list[0], comment(3, 42));
    assert_eq!(cache.page_info("42").total, 3);
    assert_eq!(cache.error("42"), None);
  }

  #[tokio::test]
  async fn test_add_before_any_load_leaves_page_info_alone() {
    let cache = cache(FakeSource::default().create(comment(1, 42)));

    cache.add("42", NewComment::text("first")).await;

    assert_eq!(cache.comments("42").len(), 1);
    assert_eq!(cache.page_info("42"), PageInfo::default());
  }

  #[tokio::test]
  async fn test_add_failure_synthesizes_local_comment() {
    let cache = cache(FakeSource::default().list(comments(1..=2, 42), None));
    cache.load("42", 0, 10).await;

    let payload = NewComment {
      content: "Reverse image search says 2015".into(),
      image_url: Some("https://img.example.org/x.png".into()),
    };
    cache.add("42", payload.clone()).await;

    let list = cache.comments("42");
    assert_eq!(list.len(), 3);
    let local = &list[0];
    assert!(matches!(local.id, CommentId::Local(_)));
    assert!(!local.deleted);
    assert_eq!(local.content, payload.content);
    assert_eq!(local.image_url, payload.image_url);
    assert_eq!(local.news_id, 42);
    assert_eq!(local.author_name, "unknown");
    assert_eq!(local.author_id, 0);
    assert_eq!(cache.error("42").as_deref(), Some("network unreachable"));
    // Only confirmed comments count towards the total
    assert_eq!(cache.page_info("42").total, 0);
  }

  #[tokio::test]
  async fn test_local_comment_uses_session_user() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let session = Arc::new(Session::restore(store.clone()));
    session.set_token("t").unwrap();
    session
      .set_user(User {
        id: 77,
        email: "grace@example.org".into(),
        name: "Grace".into(),
        image_url: None,
        roles: vec![Role::Member],
      })
      .unwrap();
    let cache = CommentCache::new(FakeSource::default(), LocalMirror::new(store), session);

    let local = cache.add("9", NewComment::text("hi")).await;

    assert_eq!((local.author_id, local.author_name.as_str()), (77, "Grace"));
  }

  #[tokio::test]
  async fn test_local_ids_are_unique() {
    let cache = cache(FakeSource::default());

    for i in 0..5 {
      cache.add("1", NewComment::text(format!("c{}", i))).await;
    }

    let mut ids: Vec<_> = cache.comments("1").into_iter().map(|c| c.id).collect();
    ids.sort_by_key(|id| id.to_string());
    ids.dedup();
    assert_eq!(ids.len(), 5);
  }

  #[tokio::test]
  async fn test_local_comment_is_dropped_by_refresh() {
    let source = FakeSource::default().list(comments(1..=1, 2), None);
    let cache = cache(source);

    cache.add("2", NewComment::text("offline")).await;
    cache.load("2", 0, 10).await;

    assert_eq!(cache.comments("2"), vec![comment(1, 2)]);
  }

  #[tokio::test]
  async fn test_clear_resets_everything() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cache = cache_with(
      FakeSource::default().list(comments(1..=3, 4), Some(3)),
      store.clone(),
    );
    cache.load("4", 0, 3).await;

    cache.clear("4");

    assert!(cache.comments("4").is_empty());
    assert_eq!(cache.status("4"), SyncStatus::Idle);
    assert!(cache.has_more("4"));
    assert_eq!(cache.page_info("4"), PageInfo::default());
    assert_eq!(LocalMirror::new(store).read("4"), Some(Vec::new()));
  }

  #[tokio::test]
  async fn test_clear_after_failed_load_drops_error() {
    let cache = cache(FakeSource::default());
    cache.load("4", 0, 10).await;
    assert_eq!(cache.status("4"), SyncStatus::Degraded);

    cache.clear("4");

    assert_eq!(cache.error("4"), None);
    assert_eq!(cache.status("4"), SyncStatus::Idle);
  }

  #[tokio::test]
  async fn test_remove_server_comment_soft_deletes() {
    let source = FakeSource::default()
      .list(comments(1..=3, 6), Some(3))
      .delete(Ok(()));
    let cache = cache(source);
    cache.load("6", 0, 10).await;

    assert!(cache.remove("6", &CommentId::Server(2)).await);

    assert_eq!(cache.comments("6").len(), 3);
    assert_eq!(cache.visible_comments("6").len(), 2);
    assert!(cache.find("6", &CommentId::Server(2)).unwrap().deleted);
    assert_eq!(cache.page_info("6").total, 2);
  }

  #[tokio::test]
  async fn test_remove_failure_leaves_list_untouched() {
    let source = FakeSource::default()
      .list(comments(1..=2, 6), None)
      .delete(Err(Error::Forbidden("no".into())));
    let cache = cache(source);
    cache.load("6", 0, 10).await;

    assert!(!cache.remove("6", &CommentId::Server(1)).await);

    assert_eq!(cache.visible_comments("6").len(), 2);
    assert_eq!(cache.error("6").as_deref(), Some("Forbidden - no"));
  }

  #[tokio::test]
  async fn test_remove_local_comment_skips_server() {
    let cache = cache(FakeSource::default());
    let local = cache.add("6", NewComment::text("draft")).await;

    assert!(cache.remove("6", &local.id).await);

    assert!(cache.comments("6").is_empty());
  }

  #[tokio::test]
  async fn test_loading_flag_while_in_flight() {
    let cache = cache(FakeSource::default().list_after(
      Duration::from_millis(40),
      comments(1..=1, 1),
      None,
    ));

    futures::join!(cache.load("1", 0, 10), async {
      tokio::time::sleep(Duration::from_millis(5)).await;
      assert!(cache.is_loading("1"));
      assert_eq!(cache.status("1"), SyncStatus::Loading);
    });

    assert!(!cache.is_loading("1"));
    assert_eq!(cache.status("1"), SyncStatus::Loaded);
  }

  #[tokio::test]
  async fn test_overlapping_loads_last_to_finish_wins() {
    let source = FakeSource::default()
      .list_after(Duration::from_millis(40), comments(1..=3, 9), None)
      .list_after(Duration::from_millis(5), comments(7..=7, 9), None);
    let cache = cache(source);

    futures::join!(cache.load("9", 0, 10), cache.load("9", 0, 10));

    assert_eq!(cache.comments("9"), comments(1..=3, 9));
    assert!(!cache.is_loading("9"));
  }

  #[tokio::test]
  async fn test_keys_are_independent() {
    let source = FakeSource::default()
      .list(comments(1..=2, 1), None)
      .list_fails();
    let cache = cache(source);

    futures::join!(cache.load("1", 0, 10), cache.load("2", 0, 10));

    assert_eq!(cache.comments("1").len(), 2);
    assert_eq!(cache.error("1"), None);
    assert!(cache.comments("2").is_empty());
    assert!(cache.error("2").is_some());
  }
}
