//! Seam between the comment cache and whatever serves comments remotely.

use std::future::Future;

use crate::api::types::{Comment, CommentId, NewComment, Page, PageRequest};
use crate::error::Result;

/// Remote source of comments for news items.
///
/// `news_key` is the string key of the parent news item, used verbatim in
/// request paths.
pub trait CommentSource: Send + Sync {
  /// Fetch one page of comments.
  fn list_comments(
    &self,
    news_key: &str,
    request: &PageRequest,
  ) -> impl Future<Output = Result<Page<Comment>>> + Send;

  /// Create a comment and return it as stored by the server.
  fn create_comment(
    &self,
    news_key: &str,
    comment: &NewComment,
  ) -> impl Future<Output = Result<Comment>> + Send;

  /// Delete (soft-delete on the server) a comment.
  fn delete_comment(
    &self,
    news_key: &str,
    comment_id: &CommentId,
  ) -> impl Future<Output = Result<()>> + Send;
}
