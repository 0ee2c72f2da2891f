mod api;
mod app;
mod cache;
mod config;
mod error;
mod session;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::api::types::{NewNews, NewsQuery, NewsStatus, Role, VoteValue};

#[derive(Parser, Debug)]
#[command(name = "afn")]
#[command(about = "Browse, discuss and vote on news items from the terminal, even offline")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/afn/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Keep the local store in memory only
  #[arg(long)]
  ephemeral: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List comments on a news item
  Comments {
    news_id: i64,
    #[arg(short, long, default_value_t = 0)]
    page: u32,
    #[arg(short, long)]
    size: Option<u32>,
    /// Include soft-deleted comments (administrators)
    #[arg(long)]
    include_deleted: bool,
    /// Keep loading pages until the server has no more
    #[arg(long)]
    all: bool,
  },
  /// Comment on a news item
  Comment {
    news_id: i64,
    content: String,
    /// URL of an image to attach
    #[arg(long)]
    image: Option<String>,
  },
  /// Delete a comment (its author or an administrator)
  DeleteComment { news_id: i64, comment_id: String },
  /// Forget the locally cached comments of a news item
  Clear { news_id: i64 },
  /// Vote on whether a news item is fake
  Vote { news_id: i64, value: VoteArg },
  /// Show the vote counts of a news item
  Votes { news_id: i64 },
  /// Withdraw a vote
  WithdrawVote { news_id: i64, vote_id: i64 },
  /// List news items
  News {
    #[arg(short, long)]
    page: Option<u32>,
    #[arg(short, long)]
    size: Option<u32>,
    /// Search titles, summaries and reporters
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<StatusArg>,
  },
  /// Show a news item with its votes and comments
  Show { news_id: i64 },
  /// Publish a news item (members and administrators)
  Publish {
    title: String,
    /// One-line summary
    #[arg(long)]
    summary: String,
    /// Full text of the item
    #[arg(long)]
    detail: String,
    #[arg(long)]
    reporter: String,
    /// Image URL, may be repeated
    #[arg(long = "image")]
    images: Vec<String>,
    #[arg(long)]
    status: Option<StatusArg>,
  },
  /// Moderation commands (administrators)
  Admin {
    #[command(subcommand)]
    action: AdminAction,
  },
  /// Manage the stored credential
  Auth {
    #[command(subcommand)]
    action: AuthAction,
  },
}

#[derive(Subcommand, Debug)]
enum AuthAction {
  /// Store a bearer token for later requests
  SetToken { token: String },
  /// Forget the stored token and user
  Logout,
  /// Show the user behind the stored token
  Whoami,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
  /// List every user with their roles
  Users,
  /// Change the role of a user
  SetRole { user_id: i64, role: RoleArg },
  /// List every news item, deleted ones included
  News,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VoteArg {
  Fake,
  NotFake,
}

impl From<VoteArg> for VoteValue {
  fn from(value: VoteArg) -> Self {
    match value {
      VoteArg::Fake => VoteValue::Fake,
      VoteArg::NotFake => VoteValue::NotFake,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
  Fake,
  NonFake,
  Unknown,
}

impl From<StatusArg> for NewsStatus {
  fn from(value: StatusArg) -> Self {
    match value {
      StatusArg::Fake => NewsStatus::Fake,
      StatusArg::NonFake => NewsStatus::NonFake,
      StatusArg::Unknown => NewsStatus::Unknown,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RoleArg {
  Reader,
  Member,
  Admin,
}

impl From<RoleArg> for Role {
  fn from(value: RoleArg) -> Self {
    match value {
      RoleArg::Reader => Role::Reader,
      RoleArg::Member => Role::Member,
      RoleArg::Admin => Role::Admin,
    }
  }
}

/// Log to `<data dir>/afn.log` so command output stays clean.
///
/// Filter with `AFN_LOG` (default `warn`).
fn init_tracing() -> Result<WorkerGuard> {
  let log_dir = config::Config::data_dir()?;
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(&log_dir, "afn.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("AFN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing()?;

  let config = config::Config::load(args.config.as_deref())?;
  let app = app::App::new(config, args.ephemeral)?;

  match args.command {
    Command::Comments {
      news_id,
      page,
      size,
      include_deleted,
      all,
    } => {
      app
        .list_comments(news_id, page, size, include_deleted, all)
        .await?
    }
    Command::Comment {
      news_id,
      content,
      image,
    } => app.post_comment(news_id, content, image).await?,
    Command::DeleteComment {
      news_id,
      comment_id,
    } => app.delete_comment(news_id, &comment_id).await?,
    Command::Clear { news_id } => app.clear_comments(news_id),
    Command::Vote { news_id, value } => app.vote(news_id, value.into()).await?,
    Command::Votes { news_id } => app.vote_stats(news_id).await?,
    Command::WithdrawVote { news_id, vote_id } => app.withdraw_vote(news_id, vote_id).await?,
    Command::News {
      page,
      size,
      search,
      status,
    } => {
      app
        .list_news(NewsQuery {
          page,
          size,
          search,
          status: status.map(Into::into),
        })
        .await?
    }
    Command::Show { news_id } => app.show_news(news_id).await?,
    Command::Publish {
      title,
      summary,
      detail,
      reporter,
      images,
      status,
    } => {
      app
        .publish_news(NewNews {
          title,
          short_detail: summary,
          full_detail: detail,
          reporter_name: reporter,
          image_urls: images,
          status: status.map(Into::into),
        })
        .await?
    }
    Command::Admin { action } => match action {
      AdminAction::Users => app.list_users().await?,
      AdminAction::SetRole { user_id, role } => app.set_role(user_id, role.into()).await?,
      AdminAction::News => app.list_all_news().await?,
    },
    Command::Auth { action } => match action {
      AuthAction::SetToken { token } => app.set_token(&token)?,
      AuthAction::Logout => app.logout(),
      AuthAction::Whoami => app.whoami().await?,
    },
  }

  Ok(())
}
