use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub comments: CommentsConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the news/comment/vote service
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
  /// Page size used when none is given on the command line
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for CommentsConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Location of the local store (default: $XDG_DATA_HOME/afn/store.db)
  pub path: Option<PathBuf>,
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_page_size() -> u32 {
  10
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./afn.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/afn/config.yaml
  ///
  /// Without any file the defaults apply. `AFN_API_BASE_URL` overrides `api.url`.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_env_overrides())
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("afn.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("afn").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file deserializes as null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  fn with_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var("AFN_API_BASE_URL") {
      if !url.trim().is_empty() {
        self.api.url = url;
      }
    }
    self
  }

  /// Bearer token supplied through the environment, if any.
  ///
  /// Takes precedence over the token persisted in the session store.
  pub fn env_token() -> Option<String> {
    std::env::var("AFN_TOKEN").ok().filter(|t| !t.trim().is_empty())
  }

  /// Directory for the local store and log files.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("afn"))
  }

  /// Path of the on-disk key-value store.
  pub fn store_path(&self) -> Result<PathBuf> {
    match &self.storage.path {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("store.db")),
    }
  }
}
