// grocery-client/src/session/manager.rs
// 会话管理器 - 登录、刷新、持久化

use std::sync::Arc;
use std::time::Duration;

use shared::{LoginRequest, LoginResponse, RefreshResponse, RegisterClientRequest};

use crate::http::{ApiRequest, HttpResponse, Transport};
use crate::session::{CredentialStorage, SESSION_FILE, Session};
use crate::{ClientConfig, ClientError, ClientResult};

pub const REGISTER_PATH: &str = "/api/client/register";
pub const LOGIN_PATH: &str = "/api/client/login";
pub const REFRESH_PATH: &str = "/api/client/refresh";

const SESSION_EXPIRED: &str = "Session expired, please log in again";

/// Result of one refresh attempt
#[derive(Debug)]
enum RefreshOutcome {
    Refreshed,
    /// Service refused the refresh token (401/403)
    Rejected(String),
    /// Network or service trouble; the refresh token may still be good
    Unavailable(ClientError),
    NoRefreshToken,
}

/// Owns the device session and attaches it to protected calls.
///
/// At most one session exists at a time. Only the device ID and refresh
/// token are persisted; a restored session mints its access token on start.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    storage: CredentialStorage,
    refresh_interval: Duration,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            storage: CredentialStorage::new(&config.cache_dir, SESSION_FILE),
            refresh_interval: config.refresh_interval,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.session.as_ref().map(Session::device_id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn storage(&self) -> &CredentialStorage {
        &self.storage
    }

    /// Register a new device with the ordering service. Does not log in.
    pub async fn register(
        &self,
        device_id: &str,
        password: &str,
        email: &str,
        phone: &str,
    ) -> ClientResult<()> {
        if device_id.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Device ID and password are required".into(),
            ));
        }
        let request = ApiRequest::post(REGISTER_PATH).json(&RegisterClientRequest {
            device_id: device_id.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })?;
        self.transport.send(request).await.ensure_success()?;
        tracing::info!(device_id, "Device registered");
        Ok(())
    }

    /// Log in and persist the session. Replaces any existing session.
    pub async fn login(&mut self, device_id: &str, password: &str) -> ClientResult<&Session> {
        if device_id.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Device ID and password are required".into(),
            ));
        }
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            device_id: device_id.to_string(),
            password: password.to_string(),
        })?;
        let tokens: LoginResponse = self.transport.send(request).await.json()?;
        if tokens.access_token.is_empty() {
            return Err(ClientError::InvalidResponse(
                "login response carries no access token".into(),
            ));
        }

        let session = Session::from_login(device_id, tokens);
        self.persist(&session);
        tracing::info!(device_id, "Logged in");
        Ok(&*self.session.insert(session))
    }

    /// Rebuild the session from the cache and mint a fresh access token.
    ///
    /// A rejected refresh token clears the cache and yields `Ok(None)`. When
    /// the service is unreachable the cache is kept for the next attempt and
    /// the underlying error is returned.
    pub async fn restore(&mut self) -> ClientResult<Option<&Session>> {
        let Some(credential) = self.storage.load() else {
            return Ok(None);
        };
        let device_id = credential.device_id.clone();
        self.session = Some(Session::from_credential(credential));

        match self.refresh_inner().await {
            RefreshOutcome::Refreshed => {
                tracing::info!(device_id = %device_id, "Session restored");
                Ok(self.session.as_ref())
            }
            RefreshOutcome::Unavailable(e) => {
                tracing::warn!(
                    device_id = %device_id,
                    error = %e,
                    "Service unreachable, keeping cached session"
                );
                self.session = None;
                Err(e)
            }
            outcome => {
                tracing::warn!(
                    device_id = %device_id,
                    ?outcome,
                    "Session restore failed, clearing cache"
                );
                self.invalidate();
                Ok(None)
            }
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `false` on any failure. The refresh token is kept either way.
    pub async fn refresh(&mut self) -> bool {
        match self.refresh_inner().await {
            RefreshOutcome::Refreshed => true,
            outcome => {
                tracing::warn!(?outcome, "Token refresh failed");
                false
            }
        }
    }

    /// Refresh proactively once the access token is older than the refresh interval.
    ///
    /// Returns `false` when a due refresh failed; the failure is already logged.
    pub async fn ensure_fresh(&mut self) -> bool {
        !matches!(
            self.ensure_fresh_inner().await,
            Some(outcome) if !matches!(outcome, RefreshOutcome::Refreshed)
        )
    }

    async fn ensure_fresh_inner(&mut self) -> Option<RefreshOutcome> {
        let due = self
            .session
            .as_ref()
            .is_some_and(|s| s.needs_refresh(self.refresh_interval));
        if !due {
            return None;
        }
        tracing::debug!("Access token due for refresh");
        let outcome = self.refresh_inner().await;
        if !matches!(outcome, RefreshOutcome::Refreshed) {
            tracing::warn!(?outcome, "Proactive token refresh failed");
        }
        Some(outcome)
    }

    /// Send a protected request with the current access token.
    ///
    /// A 401 triggers one refresh and one retry. A second 401, or a refresh
    /// the service rejects, surfaces [`ClientError::Auth`]; in the latter
    /// case the session and its cache are destroyed.
    pub async fn authorized_call(&mut self, request: ApiRequest) -> ClientResult<HttpResponse> {
        if self.session.is_none() {
            return Err(ClientError::Auth("Not logged in".into()));
        }

        let proactive = self.ensure_fresh_inner().await;
        let token = match (self.current_access_token(), proactive) {
            (Some(token), _) => token,
            (None, Some(RefreshOutcome::Unavailable(e))) => return Err(e),
            (None, Some(RefreshOutcome::Rejected(_))) => {
                self.invalidate();
                return Err(ClientError::Auth(SESSION_EXPIRED.into()));
            }
            (None, _) => return Err(ClientError::Auth(SESSION_EXPIRED.into())),
        };

        let response = self.transport.send(request.clone().bearer(token)).await;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        tracing::info!(path = %request.path, "Access token rejected, refreshing");
        match self.refresh_inner().await {
            RefreshOutcome::Refreshed => {}
            RefreshOutcome::Rejected(message) => {
                tracing::warn!(%message, "Refresh token rejected, dropping session");
                self.invalidate();
                return Err(ClientError::Auth(SESSION_EXPIRED.into()));
            }
            RefreshOutcome::Unavailable(e) => return Err(e),
            RefreshOutcome::NoRefreshToken => return Err(response.into_error()),
        }

        let Some(token) = self.current_access_token() else {
            return Err(ClientError::Auth(SESSION_EXPIRED.into()));
        };
        let retry = self.transport.send(request.bearer(token)).await;
        if retry.is_unauthorized() {
            return Err(retry.into_error());
        }
        Ok(retry)
    }

    /// Drop the session and delete its cache. No server call is made.
    pub fn logout(&mut self) -> ClientResult<()> {
        if let Some(session) = self.session.take() {
            tracing::info!(device_id = %session.device_id(), "Logged out");
        }
        self.storage.delete()?;
        Ok(())
    }

    fn current_access_token(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.access_token())
            .map(str::to_string)
    }

    async fn refresh_inner(&mut self) -> RefreshOutcome {
        let Some(refresh_token) = self
            .session
            .as_ref()
            .and_then(|s| s.refresh_token())
            .map(str::to_string)
        else {
            return RefreshOutcome::NoRefreshToken;
        };

        let response = self
            .transport
            .send(ApiRequest::post(REFRESH_PATH).bearer(refresh_token))
            .await;

        if matches!(response.status, 401 | 403) {
            return RefreshOutcome::Rejected(
                response.error_text().unwrap_or_else(|| "refresh rejected".into()),
            );
        }
        let body: RefreshResponse = match response.json() {
            Ok(body) => body,
            Err(e) => return RefreshOutcome::Unavailable(e),
        };
        if body.access_token.is_empty() {
            return RefreshOutcome::Unavailable(ClientError::InvalidResponse(
                "refresh response carries no access token".into(),
            ));
        }

        let Some(session) = self.session.as_mut() else {
            return RefreshOutcome::NoRefreshToken;
        };
        session.set_access_token(body.access_token);
        let session = session.clone();
        self.persist(&session);
        tracing::debug!(device_id = %session.device_id(), "Access token refreshed");
        RefreshOutcome::Refreshed
    }

    /// Write the durable part of the session. A failed write leaves the
    /// in-memory session usable; it only costs the next restore.
    fn persist(&self, session: &Session) {
        let Some(credential) = session.credential() else {
            return;
        };
        if let Err(e) = self.storage.save(&credential) {
            tracing::warn!(
                path = %self.storage.path().display(),
                error = %e,
                "Failed to persist session"
            );
        }
    }

    fn invalidate(&mut self) {
        self.session = None;
        if let Err(e) = self.storage.delete() {
            tracing::warn!(
                path = %self.storage.path().display(),
                error = %e,
                "Failed to delete session cache"
            );
        }
    }
}
