//! Session lifecycle orchestration: sign-up, verification-gated sign-in,
//! password reset, logout, bootstrap (auto-login) and expiry-driven
//! auto-logout.
//!
//! State machine per session: Anonymous → Authenticating → Authenticated →
//! (expiry timer fires | logout) → Anonymous. `Authenticating` is
//! transient and never published to the session store. Only one session is
//! held at a time; a new sign-in overwrites the previous session and
//! re-arms the expiry timer, so a stale timer can never log out a newer
//! session.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::{StateBus, Subscription};
use crate::error::{AppError, AppResult};
use crate::prefs::{Prefs, KEY_USER_DATA, KEY_USER_NAME};
use crate::signal::LoadingSignal;

use super::provider::{AuthProvider, OobRequest};
use super::session::Session;
use super::store::SessionStore;

/// Navigation request published for the view layer; the core never routes
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Home,
}

pub struct SessionLifecycle {
    provider: Arc<dyn AuthProvider>,
    store: Arc<SessionStore>,
    prefs: Arc<Prefs>,
    signal: Arc<LoadingSignal>,
    nav: StateBus<Option<NavTarget>>,
    auto_logout: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// Tear down the held session: clear the store, drop the persisted
/// snapshot and cached display name, cancel any pending expiry timer and
/// ask the view layer to navigate home. Shared between `logout()` and the
/// expiry timer task.
fn do_logout(
    store: &SessionStore,
    prefs: &Prefs,
    nav: &StateBus<Option<NavTarget>>,
    auto_logout: &Mutex<Option<JoinHandle<()>>>,
) {
    if let Some(task) = auto_logout.lock().take() {
        task.abort();
    }
    store.set(None);
    prefs.remove(KEY_USER_DATA);
    prefs.remove(KEY_USER_NAME);
    nav.set(Some(NavTarget::Home));
    info!(target: "auth", "logged out");
}

impl SessionLifecycle {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: Arc<SessionStore>,
        prefs: Arc<Prefs>,
        signal: Arc<LoadingSignal>,
    ) -> Self {
        Self {
            provider,
            store,
            prefs,
            signal,
            nav: StateBus::new(None),
            auto_logout: Arc::new(Mutex::new(None)),
        }
    }

    /// Create an account, then fire a best-effort verification email. A
    /// failure of the verification send is logged, not surfaced — the
    /// sign-up itself still succeeds. Returns the new identity id.
    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
        let _load = self.signal.guard();
        let token = self.provider.sign_up(email, password).await?;
        match self
            .provider
            .send_oob_code(OobRequest::VerifyEmail { id_token: token.id_token.clone() })
            .await
        {
            Ok(()) => info!(target: "auth", "verification email sent to {}", token.email),
            Err(e) => warn!(target: "auth", "verification email send failed: {e}"),
        }
        Ok(token.local_id)
    }

    /// Authenticate, then check the email-verified flag in a second
    /// round-trip. Unverified accounts fail with `EmailNotVerified` and the
    /// provider credentials are discarded; verified ones establish a
    /// session, persist the snapshot and arm the auto-logout timer for
    /// exactly the provider-reported lifetime.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let _load = self.signal.guard();
        let token = self.provider.sign_in_with_password(email, password).await?;
        let account = self.provider.lookup(&token.id_token).await?;
        if !account.email_verified {
            return Err(AppError::email_not_verified(
                "Please verify your email address before logging in.",
            ));
        }
        let secs = token.expires_in_secs()?;
        let session = Session::new(
            token.local_id,
            token.email,
            token.id_token,
            Utc::now() + chrono::Duration::seconds(secs),
        );
        self.establish(session.clone());
        info!(target: "auth", "signed in {} until {}", session.email, session.expires_at);
        Ok(session)
    }

    /// Fire-and-forget password-reset request; success means the request
    /// was accepted, not that the email was delivered.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let _load = self.signal.guard();
        self.provider
            .send_oob_code(OobRequest::PasswordReset { email: email.to_string() })
            .await
    }

    /// Re-authenticate to obtain a fresh one-time token, then send the
    /// verification email again. No session is created.
    pub async fn resend_verification(&self, email: &str, password: &str) -> AppResult<()> {
        let _load = self.signal.guard();
        let token = self.provider.sign_in_with_password(email, password).await?;
        self.provider
            .send_oob_code(OobRequest::VerifyEmail { id_token: token.id_token })
            .await?;
        info!(target: "auth", "verification email re-sent to {email}");
        Ok(())
    }

    pub fn logout(&self) {
        do_logout(&self.store, &self.prefs, &self.nav, &self.auto_logout);
    }

    /// Rehydrate the persisted session at process start. An expired
    /// snapshot is discarded without ever being published; a live one is
    /// published and gets an auto-logout timer for the remaining duration.
    pub fn bootstrap(&self) {
        let Some(session) = self.prefs.get::<Session>(KEY_USER_DATA) else {
            return;
        };
        if !session.is_live_at(Utc::now()) {
            info!(target: "auth", "discarding expired session snapshot for {}", session.email);
            self.prefs.remove(KEY_USER_DATA);
            return;
        }
        info!(target: "auth", "restored session for {} until {}", session.email, session.expires_at);
        self.store.set(Some(session.clone()));
        self.arm_auto_logout(&session);
    }

    /// Cache the user's display name locally (best effort; cleared by
    /// logout).
    pub fn remember_display_name(&self, name: &str) {
        if let Err(e) = self.prefs.set(KEY_USER_NAME, &name.to_string()) {
            warn!(target: "auth", "failed to cache display name: {e:#}");
        }
    }

    pub fn display_name(&self) -> Option<String> {
        self.prefs.get::<String>(KEY_USER_NAME)
    }

    /// Latest-value-replay subscription to navigation requests.
    pub fn observe_nav<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Option<NavTarget>) + Send + 'static,
    {
        self.nav.observe(callback)
    }

    fn establish(&self, session: Session) {
        self.store.set(Some(session.clone()));
        if let Err(e) = self.prefs.set(KEY_USER_DATA, &session) {
            warn!(target: "auth", "failed to persist session snapshot: {e:#}");
        }
        self.arm_auto_logout(&session);
    }

    /// Arm the expiry timer, superseding any previously armed one. The
    /// woken task re-checks that the session it was armed for is still the
    /// held one, so a timer outlived by a newer login stays inert even if
    /// the abort raced its wake-up.
    fn arm_auto_logout(&self, session: &Session) {
        let remaining = session.remaining_from(Utc::now());
        let token = session.session_token.clone();
        let store = Arc::clone(&self.store);
        let prefs = Arc::clone(&self.prefs);
        let nav = self.nav.clone();
        let slot = Arc::clone(&self.auto_logout);
        let task = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let still_current = store
                .current()
                .map(|s| s.session_token == token)
                .unwrap_or(false);
            if still_current {
                info!(target: "auth", "session expired, logging out");
                do_logout(&store, &prefs, &nav, &slot);
            }
        });
        let mut slot = self.auto_logout.lock();
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }
}
