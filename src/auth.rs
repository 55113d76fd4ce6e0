use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::DashboardError;

/// Shown in the header when the session carries no email.
pub const FALLBACK_USER: &str = "Admin";

/// Signed-in admin session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn display_email(&self) -> &str {
        self.email.as_deref().filter(|e| !e.is_empty()).unwrap_or(FALLBACK_USER)
    }
}

/// Broadcasts session changes to subscribers.
pub struct SessionHub {
    tx: watch::Sender<Option<Session>>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn publish(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// The new subscription sees the current session immediately.
    pub fn subscribe(&self) -> SessionSubscription {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        SessionSubscription { rx }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener handle returned by [`SessionHub::subscribe`].
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    /// Returns the latest session if it changed since the last poll.
    pub fn poll(&mut self) -> Option<Option<Session>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Stop listening. Consumes the handle so it can only happen once.
    pub fn unsubscribe(self) {
        drop(self.rx);
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DashboardError>;

    async fn sign_out(&self);

    fn current_session(&self) -> Option<Session>;

    fn subscribe(&self) -> SessionSubscription;
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    email: Option<String>,
}

#[derive(Deserialize, Default)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

impl AuthErrorBody {
    fn message(self, status: StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.error)
            .unwrap_or_else(|| status.to_string())
    }
}

/// Password auth against a GoTrue-compatible endpoint (Supabase Auth).
pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    hub: SessionHub,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            hub: SessionHub::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, DashboardError> {
        let url = config.supabase_url.as_deref().ok_or_else(|| {
            DashboardError::Config("SUPABASE_URL must be set for the dashboard".to_string())
        })?;
        let key = config.supabase_anon_key.as_deref().ok_or_else(|| {
            DashboardError::Config("SUPABASE_ANON_KEY must be set for the dashboard".to_string())
        })?;

        Ok(Self::new(url, key))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

#[async_trait]
impl SessionProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DashboardError> {
        let response = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| DashboardError::Auth(format!("Login failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            let message = body.message(status);
            warn!(%status, "sign-in rejected: {}", message);
            return Err(DashboardError::Auth(format!("Login failed: {}", message)));
        }

        let token: TokenResponse = response.json().await?;
        let session = Session {
            access_token: token.access_token,
            email: token.user.and_then(|u| u.email),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        };

        info!(email = session.display_email(), "signed in");
        self.hub.publish(Some(session.clone()));
        Ok(session)
    }

    /// The local session is cleared even if the server call fails.
    async fn sign_out(&self) {
        if let Some(session) = self.hub.current() {
            let result = self
                .client
                .post(self.endpoint("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!(status = %response.status(), "logout request rejected");
                }
                Err(e) => warn!("logout request failed: {}", e),
                Ok(_) => {}
            }
        }

        info!("signed out");
        self.hub.publish(None);
    }

    fn current_session(&self) -> Option<Session> {
        self.hub.current()
    }

    fn subscribe(&self) -> SessionSubscription {
        self.hub.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(email: Option<&str>) -> Session {
        Session {
            access_token: "token".to_string(),
            email: email.map(str::to_string),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn subscriber_sees_current_session_first() {
        let hub = SessionHub::new();
        hub.publish(Some(session(Some("studio@example.com"))));

        let mut sub = hub.subscribe();
        let first = sub.poll().expect("initial delivery");
        assert_eq!(first.unwrap().display_email(), "studio@example.com");
        assert!(sub.poll().is_none());
    }

    #[test]
    fn subscriber_sees_sign_out() {
        let hub = SessionHub::new();
        hub.publish(Some(session(None)));
        let mut sub = hub.subscribe();
        sub.poll();

        hub.publish(None);
        assert_eq!(sub.poll(), Some(None));
        assert_eq!(hub.current(), None);
    }

    #[test]
    fn unsubscribe_releases_the_listener() {
        let hub = SessionHub::new();
        let sub = hub.subscribe();
        let other = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        sub.unsubscribe();
        assert_eq!(hub.subscriber_count(), 1);
        other.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);

        // publishing with nobody listening is fine
        hub.publish(None);
    }

    #[test]
    fn display_email_falls_back_to_admin() {
        assert_eq!(session(None).display_email(), "Admin");
        assert_eq!(session(Some("")).display_email(), "Admin");
        assert_eq!(session(Some("a@b.in")).display_email(), "a@b.in");
    }

    #[test]
    fn expired_sessions_are_invalid() {
        let mut s = session(None);
        assert!(s.is_valid(Utc::now()));
        s.expires_at = Utc::now() - Duration::seconds(1);
        assert!(!s.is_valid(Utc::now()));
    }

    #[test]
    fn base_url_is_normalised() {
        let auth = SupabaseAuth::new("https://demo.supabase.co/", "anon");
        assert_eq!(auth.endpoint("logout"), "https://demo.supabase.co/auth/v1/logout");
        assert!(auth.current_session().is_none());
    }
}
