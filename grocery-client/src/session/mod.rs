// grocery-client/src/session/mod.rs
// 会话管理模块

pub mod credential;
pub mod manager;

pub use credential::{Credential, CredentialStorage, SESSION_FILE};
pub use manager::SessionManager;

use std::fmt;
use std::time::Duration;

use shared::LoginResponse;
use tokio::time::Instant;

/// What a session can currently do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Holds an access token
    Authenticated,
    /// No access token, but a refresh token may mint one
    Recoverable,
    /// Nothing usable; log in again
    Unauthenticated,
}

/// In-memory session for one device
#[derive(Clone)]
pub struct Session {
    device_id: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    last_refresh_at: Option<Instant>,
}

impl Session {
    pub(crate) fn from_login(device_id: impl Into<String>, tokens: LoginResponse) -> Self {
        Self {
            device_id: device_id.into(),
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token).filter(|t| !t.is_empty()),
            last_refresh_at: Some(Instant::now()),
        }
    }

    /// Rebuilt from the cache: refresh token only, access token still to mint.
    pub(crate) fn from_credential(credential: Credential) -> Self {
        Self {
            device_id: credential.device_id,
            access_token: None,
            refresh_token: Some(credential.refresh_token).filter(|t| !t.is_empty()),
            last_refresh_at: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// When the current access token was obtained
    pub fn last_refresh_at(&self) -> Option<Instant> {
        self.last_refresh_at
    }

    pub fn auth_state(&self) -> AuthState {
        match (&self.access_token, &self.refresh_token) {
            (Some(_), _) => AuthState::Authenticated,
            (None, Some(_)) => AuthState::Recoverable,
            (None, None) => AuthState::Unauthenticated,
        }
    }

    pub(crate) fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
        self.last_refresh_at = Some(Instant::now());
    }

    /// Access token missing or older than `interval`, and a refresh token to fix it
    pub(crate) fn needs_refresh(&self, interval: Duration) -> bool {
        if self.refresh_token.is_none() {
            return false;
        }
        match (&self.access_token, self.last_refresh_at) {
            (Some(_), Some(at)) => at.elapsed() >= interval,
            _ => true,
        }
    }

    pub(crate) fn credential(&self) -> Option<Credential> {
        self.refresh_token
            .as_ref()
            .map(|token| Credential::new(self.device_id.clone(), token.clone()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("device_id", &self.device_id)
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("last_refresh_at", &self.last_refresh_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> LoginResponse {
        LoginResponse {
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
        }
    }

    #[test]
    fn test_auth_states() {
        let session = Session::from_login("fridge-1", tokens());
        assert_eq!(session.auth_state(), AuthState::Authenticated);

        let restored = Session::from_credential(Credential::new("fridge-1", "refresh-1"));
        assert_eq!(restored.auth_state(), AuthState::Recoverable);
        assert!(restored.last_refresh_at().is_none());

        let empty = Session::from_credential(Credential::new("fridge-1", ""));
        assert_eq!(empty.auth_state(), AuthState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_needs_refresh_after_interval() {
        let interval = Duration::from_secs(240);
        let session = Session::from_login("fridge-1", tokens());
        assert!(!session.needs_refresh(interval));

        tokio::time::advance(Duration::from_secs(241)).await;
        assert!(session.needs_refresh(interval));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", Session::from_login("fridge-1", tokens()));
        assert!(!rendered.contains("access-1"));
        assert!(!rendered.contains("refresh-1"));
        assert!(rendered.contains("fridge-1"));
    }
}
