use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::api::envelope::{decode_list, decode_payload, total_count};
use crate::api::types::{
  Comment, CommentId, NewComment, NewNews, NewsItem, NewsQuery, Page, PageRequest, Role, User,
  VoteRequest, VoteStats, VoteValue,
};
use crate::cache::CommentSource;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::session::Session;

/// Message carried by `Error::Forbidden`
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";

/// Client for the news/comment/vote service.
///
/// Every request carries the session's bearer token when there is one.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  session: Arc<Session>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, session: Arc<Session>) -> Result<Self> {
    let base_url = Url::parse(&config.url)?;
    if base_url.cannot_be_a_base() {
      return Err(Error::InvalidUrl(format!("{} cannot be a base URL", config.url)));
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| Error::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self {
      http,
      base_url,
      session,
    })
  }

  /// Build `<base>/<segments...>`, percent-encoding each segment.
  fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// Issue a request and classify the response status.
  ///
  /// `fallback` is the error message used when a failed response has no body.
  async fn send(
    &self,
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
    fallback: &str,
  ) -> Result<Response> {
    let mut request = self
      .http
      .request(method.clone(), url.clone())
      .header(CONTENT_TYPE, "application/json");

    if let Some(token) = self.session.token() {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.body(body);
    }

    let response = request.send().await.map_err(|e| {
      warn!(%method, %url, "Request failed: {}", e);
      Error::RequestFailed(format!("{}: {}", fallback, e))
    })?;

    let status = response.status();
    debug!(%method, %url, status = status.as_u16(), "Request completed");

    match status {
      StatusCode::UNAUTHORIZED => {
        warn!(%url, "Credential rejected, clearing session");
        self.session.clear();
        Err(Error::Unauthorized)
      }
      StatusCode::FORBIDDEN => Err(Error::Forbidden(FORBIDDEN_MESSAGE.to_string())),
      s if s.is_success() => Ok(response),
      _ => {
        let text = response.text().await.unwrap_or_default();
        if text.trim().is_empty() {
          Err(Error::RequestFailed(fallback.to_string()))
        } else {
          Err(Error::RequestFailed(text))
        }
      }
    }
  }

  async fn get<T: DeserializeOwned>(&self, url: Url, fallback: &str) -> Result<T> {
    let response = self.send(Method::GET, url, None, fallback).await?;
    read_payload(response).await
  }

  async fn get_page<T: DeserializeOwned>(&self, url: Url, fallback: &str) -> Result<Page<T>> {
    let response = self.send(Method::GET, url, None, fallback).await?;
    let total = total_count(response.headers());
    let body = read_body(response).await?;
    let items = decode_list(&body).map_err(|e| Error::Decode(e.to_string()))?;

    Ok(Page { items, total })
  }

  async fn post<B: Serialize>(&self, url: Url, body: &B, fallback: &str) -> Result<Response> {
    let body = serde_json::to_vec(body)
      .map_err(|e| Error::RequestFailed(format!("Failed to encode request: {}", e)))?;
    self.send(Method::POST, url, Some(body), fallback).await
  }

  async fn put(&self, url: Url, fallback: &str) -> Result<Response> {
    self.send(Method::PUT, url, None, fallback).await
  }

  async fn delete(&self, url: Url, fallback: &str) -> Result<()> {
    self.send(Method::DELETE, url, None, fallback).await?;
    Ok(())
  }

  /// List news items
  pub async fn list_news(&self, query: &NewsQuery) -> Result<Page<NewsItem>> {
    let mut url = self.endpoint(&["news"])?;
    {
      let mut pairs = url.query_pairs_mut();
      if let Some(page) = query.page {
        pairs.append_pair("page", &page.to_string());
      }
      if let Some(size) = query.size.filter(|s| *s > 0) {
        pairs.append_pair("size", &size.to_string());
      }
      if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        pairs.append_pair("search", search);
      }
      if let Some(status) = query.status {
        pairs.append_pair("status", status.as_str());
      }
    }
    strip_empty_query(&mut url);

    self.get_page(url, "Failed to get news list").await
  }

  /// Get a single news item
  pub async fn get_news(&self, news_id: i64) -> Result<NewsItem> {
    let url = self.endpoint(&["news", &news_id.to_string()])?;
    self.get(url, "Failed to get news").await
  }

  /// Cast or change the current user's vote on a news item
  pub async fn submit_vote(&self, news_id: i64, value: VoteValue) -> Result<()> {
    let url = self.endpoint(&["news", &news_id.to_string(), "votes"])?;
    self
      .post(url, &VoteRequest { value }, "Failed to submit vote")
      .await?;
    Ok(())
  }

  /// Vote counts for a news item, including the caller's own vote
  pub async fn vote_stats(&self, news_id: i64) -> Result<VoteStats> {
    let url = self.endpoint(&["news", &news_id.to_string(), "votes"])?;
    self.get(url, "Failed to get vote stats").await
  }

  /// Withdraw a vote (its author or an administrator)
  pub async fn withdraw_vote(&self, news_id: i64, vote_id: i64) -> Result<()> {
    let url = self.endpoint(&["news", &news_id.to_string(), "votes", &vote_id.to_string()])?;
    self.delete(url, "Failed to delete vote").await
  }

  /// The user the current credential belongs to
  pub async fn current_user(&self) -> Result<User> {
    let url = self.endpoint(&["auth", "me"])?;
    self.get(url, "Failed to get current user").await
  }

  /// Publish a news item (members and administrators)
  pub async fn create_news(&self, news: &NewNews) -> Result<NewsItem> {
    let url = self.endpoint(&["news"])?;
    let response = self.post(url, news, "Failed to create news").await?;
    read_payload(response).await
  }

  /// Every registered user (administrators)
  pub async fn list_users(&self) -> Result<Vec<User>> {
    let url = self.endpoint(&["admin", "users"])?;
    let page = self.get_page(url, "Failed to get users").await?;
    Ok(page.items)
  }

  /// Change a user's role (administrators). Returns the service's message.
  pub async fn update_user_role(&self, user_id: i64, role: Role) -> Result<String> {
    let mut url = self.endpoint(&["admin", "users", &user_id.to_string(), "role"])?;
    url.query_pairs_mut().append_pair("role", role.as_str());

    let response = self.put(url, "Failed to update user role").await?;
    response
      .text()
      .await
      .map_err(|e| Error::RequestFailed(format!("Failed to read response: {}", e)))
  }

  /// Every news item, soft-deleted ones included (administrators)
  pub async fn list_all_news(&self) -> Result<Vec<NewsItem>> {
    let url = self.endpoint(&["admin", "news"])?;
    let page = self.get_page(url, "Failed to get all news").await?;
    Ok(page.items)
  }
}

impl CommentSource for ApiClient {
  async fn list_comments(&self, news_key: &str, request: &PageRequest) -> Result<Page<Comment>> {
    let mut url = self.endpoint(&["news", news_key, "comments"])?;
    {
      let mut pairs = url.query_pairs_mut();
      pairs.append_pair("page", &request.page.to_string());
      if request.size > 0 {
        pairs.append_pair("size", &request.size.to_string());
      }
      if request.include_deleted {
        pairs.append_pair("includeDeleted", "true");
      }
    }

    self.get_page(url, "Failed to get comments").await
  }

  async fn create_comment(&self, news_key: &str, comment: &NewComment) -> Result<Comment> {
    let url = self.endpoint(&["news", news_key, "comments"])?;
    let response = self.post(url, comment, "Failed to create comment").await?;
    read_payload(response).await
  }

  async fn delete_comment(&self, news_key: &str, comment_id: &CommentId) -> Result<()> {
    let url = self.endpoint(&["news", news_key, "comments", &comment_id.to_string()])?;
    self.delete(url, "Failed to delete comment").await
  }
}

async fn read_body(response: Response) -> Result<Vec<u8>> {
  let body = response
    .bytes()
    .await
    .map_err(|e| Error::RequestFailed(format!("Failed to read response: {}", e)))?;
  Ok(body.to_vec())
}

async fn read_payload<T: DeserializeOwned>(response: Response) -> Result<T> {
  let body = read_body(response).await?;
  decode_payload(&body).map_err(|e| Error::Decode(e.to_string()))
}

/// `query_pairs_mut` leaves a bare `?` when nothing was appended.
fn strip_empty_query(url: &mut Url) {
  if url.query() == Some("") {
    url.set_query(None);
  }
}
