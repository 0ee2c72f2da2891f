//! Session and capability gate.
//!
//! Holds the bearer credential and the cached current user. Both are mirrored
//! into the key-value store so they survive restarts; an HTTP 401 anywhere
//! clears them.

use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::api::types::{Role, User};
use crate::cache::SharedStore;
use crate::error::{Error, Result};

const TOKEN_KEY: &str = "token";
const CURRENT_USER_KEY: &str = "currentUser";

/// Author attribution used when nobody is signed in
pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Default)]
struct SessionState {
  token: Option<String>,
  user: Option<User>,
}

pub struct Session {
  store: SharedStore,
  state: Mutex<SessionState>,
}

impl Session {
  /// Restore the session persisted in `store`.
  ///
  /// The cached user is only trusted when a token is present. A corrupt
  /// cached user is ignored.
  pub fn restore(store: SharedStore) -> Self {
    let token = match store.get(TOKEN_KEY) {
      Ok(token) => token.filter(|t| !t.is_empty()),
      Err(e) => {
        warn!("Failed to read stored token: {}", e);
        None
      }
    };

    let user = if token.is_some() {
      store
        .get(CURRENT_USER_KEY)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str::<User>(&raw).ok())
    } else {
      None
    };

    debug!(
      has_token = token.is_some(),
      has_user = user.is_some(),
      "Session restored"
    );

    Self {
      store,
      state: Mutex::new(SessionState { token, user }),
    }
  }

  fn state(&self) -> MutexGuard<'_, SessionState> {
    // The state is plain data, so a poisoned lock is still usable
    self.state.lock().unwrap_or_else(|p| p.into_inner())
  }

  /// Current bearer credential, if any.
  pub fn token(&self) -> Option<String> {
    self.state().token.clone()
  }

  pub fn current_user(&self) -> Option<User> {
    self.state().user.clone()
  }

  /// Store a new credential. The previously cached user no longer applies.
  pub fn set_token(&self, token: &str) -> Result<()> {
    {
      let mut state = self.state();
      state.token = Some(token.to_string());
      state.user = None;
    }
    self.store.remove(CURRENT_USER_KEY)?;
    self.store.set(TOKEN_KEY, token)
  }

  /// Use a credential for this process only, without persisting it.
  pub fn adopt_token(&self, token: &str) {
    let mut state = self.state();
    if state.token.as_deref() != Some(token) {
      state.token = Some(token.to_string());
      state.user = None;
    }
  }

  /// Cache the user returned by the service.
  pub fn set_user(&self, user: User) -> Result<()> {
    let raw = serde_json::to_string(&user)
      .map_err(|e| Error::StorageUnavailable(format!("Failed to serialize user: {}", e)))?;
    self.state().user = Some(user);
    self.store.set(CURRENT_USER_KEY, &raw)
  }

  /// Forget the credential and the cached user, in memory and in the store.
  ///
  /// Store failures are logged; the in-memory session is cleared regardless.
  pub fn clear(&self) {
    {
      let mut state = self.state();
      state.token = None;
      state.user = None;
    }
    for key in [TOKEN_KEY, CURRENT_USER_KEY] {
      if let Err(e) = self.store.remove(key) {
        warn!("Failed to remove {} from store: {}", key, e);
      }
    }
  }

  pub fn is_authenticated(&self) -> bool {
    let state = self.state();
    state.token.is_some() && state.user.is_some()
  }

  pub fn has_role(&self, role: Role) -> bool {
    self
      .state()
      .user
      .as_ref()
      .is_some_and(|u| u.roles.contains(&role))
  }

  pub fn is_admin(&self) -> bool {
    self.has_role(Role::Admin)
  }

  /// Members may publish news.
  pub fn is_member(&self) -> bool {
    self.has_role(Role::Member)
  }

  pub fn is_reader(&self) -> bool {
    self.has_role(Role::Reader)
  }

  pub fn display_name(&self) -> String {
    self
      .state()
      .user
      .as_ref()
      .map(|u| u.name.clone())
      .unwrap_or_else(|| "Guest".to_string())
  }

  /// Author id and name to attribute locally created entities to.
  pub fn author(&self) -> (i64, String) {
    match &self.state().user {
      Some(user) => (user.id, user.name.clone()),
      None => (0, UNKNOWN_AUTHOR.to_string()),
    }
  }
}
