//! Domain types exchanged with the news/comment/vote service.
//!
//! Field names follow the service's camelCase JSON so the same types are
//! used on the wire and in the local mirror.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comment identifier.
///
/// The server assigns integers. Comments created while the server was
/// unreachable get a client-side string id that is never reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentId {
  Server(i64),
  Local(String),
}

impl CommentId {
  pub fn is_local(&self) -> bool {
    matches!(self, CommentId::Local(_))
  }
}

impl fmt::Display for CommentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommentId::Server(id) => write!(f, "{}", id),
      CommentId::Local(id) => f.write_str(id),
    }
  }
}

impl std::str::FromStr for CommentId {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.parse::<i64>() {
      Ok(id) => CommentId::Server(id),
      Err(_) => CommentId::Local(s.to_string()),
    })
  }
}

/// A comment attached to a news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: CommentId,
  pub news_id: i64,
  pub author_id: i64,
  pub author_name: String,
  pub content: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  pub created_at: String,
  #[serde(default)]
  pub deleted: bool,
}

/// Body of a comment creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
  pub content: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

impl NewComment {
  pub fn text(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      image_url: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsStatus {
  Fake,
  NonFake,
  Unknown,
}

impl NewsStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      NewsStatus::Fake => "FAKE",
      NewsStatus::NonFake => "NON_FAKE",
      NewsStatus::Unknown => "UNKNOWN",
    }
  }
}

/// News item as listed by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
  pub id: i64,
  pub title: String,
  #[serde(default)]
  pub short_detail: String,
  #[serde(default)]
  pub full_detail: String,
  #[serde(default)]
  pub image_urls: Vec<String>,
  #[serde(default)]
  pub reporter_name: String,
  #[serde(default)]
  pub created_by: String,
  pub status: NewsStatus,
  #[serde(default)]
  pub deleted: bool,
  #[serde(default)]
  pub created_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deleted_at: Option<String>,
}

/// Body of a news creation request (members and administrators)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNews {
  pub title: String,
  pub short_detail: String,
  pub full_detail: String,
  pub reporter_name: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub image_urls: Vec<String>,
  /// Server default is `UNKNOWN`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<NewsStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteValue {
  Fake,
  NotFake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
  pub value: VoteValue,
}

/// Aggregated votes for one news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStats {
  pub news_id: i64,
  pub fake_count: u64,
  pub not_fake_count: u64,
  #[serde(default)]
  pub my_vote: Option<VoteValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  Reader,
  Member,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Reader => "READER",
      Role::Member => "MEMBER",
      Role::Admin => "ADMIN",
    }
  }
}

/// Authenticated user as returned by `/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub email: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default)]
  pub roles: Vec<Role>,
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// Value of `X-Total-Count`, when the service sent it
  pub total: Option<u64>,
}

/// Pagination parameters for the comment list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub size: u32,
  pub include_deleted: bool,
}

impl PageRequest {
  pub fn new(page: u32, size: u32) -> Self {
    Self {
      page,
      size,
      include_deleted: false,
    }
  }
}

/// Filters for the news list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
  pub page: Option<u32>,
  pub size: Option<u32>,
  /// Matched against title, summary and reporter
  pub search: Option<String>,
  pub status: Option<NewsStatus>,
}
