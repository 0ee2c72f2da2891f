use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;

use crate::api::types::{
  Comment, CommentId, NewComment, NewNews, NewsItem, NewsQuery, PageRequest, Role, User,
  VoteStats, VoteValue,
};
use crate::api::ApiClient;
use crate::cache::{
  CommentCache, LocalMirror, MemoryStore, PageInfo, SharedStore, SqliteStore, SyncStatus,
};
use crate::config::Config;
use crate::session::Session;

/// Application context.
///
/// Created once at startup; owns the store, the session, the remote client
/// and the comment cache that the commands operate on.
pub struct App {
  config: Config,
  session: Arc<Session>,
  api: ApiClient,
  comments: CommentCache<ApiClient>,
}

impl App {
  /// Build the context. With `ephemeral`, nothing is written to disk.
  pub fn new(config: Config, ephemeral: bool) -> Result<Self> {
    let store: SharedStore = if ephemeral {
      Arc::new(MemoryStore::new())
    } else {
      Arc::new(SqliteStore::open(&config.store_path()?)?)
    };

    let session = Arc::new(Session::restore(store.clone()));
    if let Some(token) = Config::env_token() {
      session.adopt_token(&token);
    }

    let api = ApiClient::new(&config.api, session.clone())?;
    let comments = CommentCache::new(api.clone(), LocalMirror::new(store), session.clone());

    Ok(Self {
      config,
      session,
      api,
      comments,
    })
  }

  fn page_size(&self, size: Option<u32>) -> u32 {
    size
      .filter(|s| *s > 0)
      .unwrap_or(self.config.comments.page_size)
      .max(1)
  }

  /// Print one page of comments, or every page with `all`.
  pub async fn list_comments(
    &self,
    news_id: i64,
    page: u32,
    size: Option<u32>,
    include_deleted: bool,
    all: bool,
  ) -> Result<()> {
    let key = news_id.to_string();
    let request = PageRequest {
      page: if all { 0 } else { page },
      size: self.page_size(size),
      include_deleted,
    };

    self.comments.load_page(&key, request).await;
    if all {
      // A failed page resets has_more; an empty page means the server's total is off
      while self.comments.has_more(&key) {
        let loaded = self.comments.comments(&key).len();
        let info = self.comments.page_info(&key);
        let next = PageRequest {
          page: info.page + 1,
          ..request
        };
        self.comments.load_page(&key, next).await;
        if self.comments.comments(&key).len() == loaded {
          break;
        }
      }
    }

    self.print_comments(&key, include_deleted);
    Ok(())
  }

  /// Post a comment. The current first page is loaded first so the local
  /// mirror keeps the rest of the thread.
  pub async fn post_comment(
    &self,
    news_id: i64,
    content: String,
    image_url: Option<String>,
  ) -> Result<()> {
    if content.trim().is_empty() {
      return Err(eyre!("Comment content must not be blank"));
    }

    let key = news_id.to_string();
    self.comments.load(&key, 0, self.page_size(None)).await;

    let mut comment = NewComment::text(content);
    comment.image_url = image_url;
    let created = self.comments.add(&key, comment).await;

    match created.id {
      CommentId::Server(_) => println!("Posted comment {}", created.id),
      CommentId::Local(_) => {
        let reason = self.comments.error(&key).unwrap_or_default();
        println!(
          "Could not reach the server ({}). Comment kept locally as {}",
          reason, created.id
        );
      }
    }
    Ok(())
  }

  pub async fn delete_comment(&self, news_id: i64, comment_id: &str) -> Result<()> {
    let key = news_id.to_string();
    let comment_id: CommentId = comment_id
      .parse()
      .map_err(|_| eyre!("Invalid comment id: {}", comment_id))?;

    self.comments.load(&key, 0, self.page_size(None)).await;
    let known = self.comments.find(&key, &comment_id);

    // A successful reload drops local-only comments
    if known.is_none() && comment_id.is_local() {
      return Err(eyre!("Comment {} not found", comment_id));
    }

    if self.comments.remove(&key, &comment_id).await {
      match known {
        Some(comment) => println!("Deleted comment {} ({})", comment_id, comment.content),
        None => println!("Deleted comment {}", comment_id),
      }
      Ok(())
    } else {
      Err(eyre!(
        "Failed to delete comment {}: {}",
        comment_id,
        self.comments.error(&key).unwrap_or_default()
      ))
    }
  }

  /// Drop everything cached locally for a news item.
  pub fn clear_comments(&self, news_id: i64) {
    self.comments.clear(&news_id.to_string());
    println!("Cleared cached comments for news {}", news_id);
  }

  pub async fn vote(&self, news_id: i64, value: VoteValue) -> Result<()> {
    self.api.submit_vote(news_id, value).await?;
    let stats = self.api.vote_stats(news_id).await?;
    println!("{}", format_vote_stats(&stats));
    Ok(())
  }

  pub async fn vote_stats(&self, news_id: i64) -> Result<()> {
    let stats = self.api.vote_stats(news_id).await?;
    println!("{}", format_vote_stats(&stats));
    Ok(())
  }

  pub async fn withdraw_vote(&self, news_id: i64, vote_id: i64) -> Result<()> {
    self.api.withdraw_vote(news_id, vote_id).await?;
    println!("Withdrew vote {}", vote_id);
    Ok(())
  }

  pub async fn list_news(&self, query: NewsQuery) -> Result<()> {
    let page = self.api.list_news(&query).await?;
    for item in &page.items {
      println!("{}", format_news_line(item));
    }
    match page.total {
      Some(total) => println!("{} of {} news items", page.items.len(), total),
      None => println!("{} news items", page.items.len()),
    }
    Ok(())
  }

  /// Print a news item with its votes and first page of comments.
  pub async fn show_news(&self, news_id: i64) -> Result<()> {
    let item = self.api.get_news(news_id).await?;
    println!("{}", format_news_line(&item));
    if !item.short_detail.is_empty() {
      println!("\n{}", item.short_detail);
    }
    if !item.full_detail.is_empty() {
      println!("\n{}", item.full_detail);
    }
    for url in &item.image_urls {
      println!("  image: {}", url);
    }

    // Votes are optional decoration here
    match self.api.vote_stats(news_id).await {
      Ok(stats) => println!("\n{}", format_vote_stats(&stats)),
      Err(e) => println!("\nVotes unavailable: {}", e),
    }

    println!();
    self.list_comments(news_id, 0, None, false, false).await
  }

  pub async fn publish_news(&self, news: NewNews) -> Result<()> {
    let required = [
      ("title", &news.title),
      ("summary", &news.short_detail),
      ("detail", &news.full_detail),
      ("reporter", &news.reporter_name),
    ];
    if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
      return Err(eyre!("News {} must not be blank", name));
    }

    let item = self.api.create_news(&news).await?;
    println!("Published {}", format_news_line(&item));
    Ok(())
  }

  pub async fn list_users(&self) -> Result<()> {
    let users = self.api.list_users().await?;
    for user in &users {
      println!("{}", format_user_line(user));
    }
    println!("{} users", users.len());
    Ok(())
  }

  pub async fn set_role(&self, user_id: i64, role: Role) -> Result<()> {
    let message = self.api.update_user_role(user_id, role).await?;
    if message.trim().is_empty() {
      println!("User {} is now {}", user_id, role.as_str());
    } else {
      println!("{}", message.trim());
    }
    Ok(())
  }

  /// Print every news item, soft-deleted ones marked.
  pub async fn list_all_news(&self) -> Result<()> {
    let items = self.api.list_all_news().await?;
    for item in &items {
      let deleted = if item.deleted { " [deleted]" } else { "" };
      println!("{}{}", format_news_line(item), deleted);
    }
    println!("{} news items", items.len());
    Ok(())
  }

  pub fn set_token(&self, token: &str) -> Result<()> {
    self.session.set_token(token.trim())?;
    println!("Token stored");
    Ok(())
  }

  pub fn logout(&self) {
    self.session.clear();
    println!("Signed out");
  }

  /// Refresh and print the user behind the current credential.
  pub async fn whoami(&self) -> Result<()> {
    if self.session.token().is_none() {
      println!("Not signed in ({})", self.session.display_name());
      return Ok(());
    }

    match self.api.current_user().await {
      Ok(user) => self.session.set_user(user)?,
      Err(e) if e.is_fatal() => {
        println!("Not signed in: {}", e);
        return Ok(());
      }
      // Offline: fall back to the user cached by an earlier refresh
      Err(e) if self.session.is_authenticated() => {
        println!("Could not refresh user ({}), showing cached profile", e);
      }
      Err(e) => return Err(e.into()),
    }

    let roles: Vec<String> = self
      .session
      .current_user()
      .map(|u| u.roles.iter().map(|r| r.as_str().to_string()).collect())
      .unwrap_or_default();
    println!("{} ({})", self.session.display_name(), roles.join(", "));
    if self.session.is_admin() {
      println!("Administrator: may moderate news, comments and votes");
    } else if self.session.is_member() {
      println!("Member: may publish news");
    } else if self.session.is_reader() {
      println!("Reader: may comment and vote");
    }
    Ok(())
  }

  fn print_comments(&self, key: &str, include_deleted: bool) {
    let comments = if include_deleted {
      self.comments.comments(key)
    } else {
      self.comments.visible_comments(key)
    };
    for comment in &comments {
      println!("{}", format_comment(comment));
    }

    if self.comments.status(key) == SyncStatus::Degraded {
      println!(
        "warning: {} (showing locally cached comments)",
        self.comments.error(key).unwrap_or_default()
      );
    }
    println!(
      "{}",
      format_summary(comments.len(), &self.comments.page_info(key))
    );
  }
}

fn format_comment(comment: &Comment) -> String {
  let mut out = format!(
    "#{} {} at {}{}\n    {}",
    comment.id,
    comment.author_name,
    comment.created_at,
    if comment.deleted { " [deleted]" } else { "" },
    comment.content
  );
  if let Some(url) = &comment.image_url {
    out.push_str(&format!("\n    image: {}", url));
  }
  out
}

fn format_summary(shown: usize, info: &PageInfo) -> String {
  let mut out = if info.total > 0 {
    format!("{} of {} comments", shown, info.total)
  } else {
    format!("{} comments", shown)
  };
  if info.has_more {
    out.push_str(&format!(", more from page {}", info.page + 1));
  }
  out
}

fn format_news_line(item: &NewsItem) -> String {
  format!(
    "[{}] #{} {} ({})",
    item.status.as_str(),
    item.id,
    item.title,
    item.reporter_name
  )
}

fn format_user_line(user: &User) -> String {
  let roles: Vec<&str> = user.roles.iter().map(Role::as_str).collect();
  format!("#{} {} <{}> [{}]", user.id, user.name, user.email, roles.join(", "))
}

fn format_vote_stats(stats: &VoteStats) -> String {
  let mine = match stats.my_vote {
    Some(VoteValue::Fake) => ", you voted fake",
    Some(VoteValue::NotFake) => ", you voted not fake",
    None => "",
  };
  format!(
    "fake: {}  not fake: {}{}",
    stats.fake_count, stats.not_fake_count, mine
  )
}
